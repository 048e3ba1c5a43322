// SPDX-License-Identifier: Apache-2.0

/// Low-power wait primitive.
///
/// `wait_for_interrupt` returns after the next interrupt of any source has
/// been serviced. Callers must re-check their wake condition afterwards, a
/// wake-up says nothing about which interrupt fired.
pub trait Idle {
    fn wait_for_interrupt(&mut self);
}

/// Busy-spinning idle, for targets or tests without a sleep instruction.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl Idle for Spin {
    fn wait_for_interrupt(&mut self) {
        core::hint::spin_loop();
    }
}

/// Cortex-M `wfi` based idle.
#[cfg(feature = "cortex-m")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Wfi;

#[cfg(feature = "cortex-m")]
impl Idle for Wfi {
    fn wait_for_interrupt(&mut self) {
        cortex_m::asm::wfi();
    }
}

impl<T: Idle + ?Sized> Idle for &mut T {
    fn wait_for_interrupt(&mut self) {
        (**self).wait_for_interrupt();
    }
}

/// Block until `condition` holds, idling between checks.
///
/// The condition is evaluated before the first wait, so an already
/// satisfied condition returns without sleeping.
pub fn block_until<I: Idle + ?Sized>(idle: &mut I, mut condition: impl FnMut() -> bool) {
    while !condition() {
        idle.wait_for_interrupt();
    }
}
