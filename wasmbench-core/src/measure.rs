//! High-Precision Timing
//!
//! Wall-clock timing via `std::time::Instant`, paired with RDTSCP on x86_64
//! and CNTVCT_EL0 on AArch64 so each timed window also reports a raw tick
//! delta.

use std::time::{Duration, Instant};

/// Raw tick counter read at the edges of a timed window.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_cycles() -> u64 {
    let mut aux = 0u32;
    // SAFETY: rdtscp is present on every x86_64 target Wasmtime supports.
    unsafe { std::arch::x86_64::__rdtscp(&mut aux) }
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
fn read_cycles() -> u64 {
    let ticks: u64;
    // SAFETY: cntvct_el0 is readable from user space.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) ticks, options(nostack, nomem));
    }
    ticks
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
fn read_cycles() -> u64 {
    0
}

/// Whether this platform provides real cycle counters.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

/// A single timed window.
///
/// Start it immediately before the measured call and stop it immediately
/// after; nothing else belongs between the two.
pub struct Timer {
    start: Instant,
    cycles_start: u64,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        let cycles_start = read_cycles();
        Self {
            start: Instant::now(),
            cycles_start,
        }
    }

    /// Stop the timer and return the elapsed duration and cycle delta
    #[inline(always)]
    pub fn stop(&self) -> (Duration, u64) {
        let elapsed = self.start.elapsed();
        let cycles = read_cycles().saturating_sub(self.cycles_start);
        (elapsed, cycles)
    }
}

/// Run `f` inside a single timed window.
#[inline]
pub fn time<T, F>(f: F) -> (T, Duration, u64)
where
    F: FnOnce() -> T,
{
    let timer = Timer::start();
    let out = std::hint::black_box(f());
    let (elapsed, cycles) = timer.stop();
    (out, elapsed, cycles)
}

/// Move the measuring thread onto core `cpu`.
///
/// The comparison runs every candidate on the thread that calls this, so
/// all timed windows land on one core. Core indices outside the affinity
/// mask (`>= CPU_SETSIZE`) are rejected with `InvalidInput`.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> std::io::Result<()> {
    if cpu >= libc::CPU_SETSIZE as usize {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("core index {cpu} exceeds CPU_SETSIZE ({})", libc::CPU_SETSIZE),
        ));
    }

    // SAFETY: an all-zero cpu_set_t is a valid empty set and `cpu` is in range.
    let status = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(cpu, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if status == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

/// CPU pinning is a no-op outside Linux.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let (elapsed, _cycles) = timer.stop();

        assert!(elapsed >= Duration::from_millis(5));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_time_returns_closure_output() {
        let (value, elapsed, _) = time(|| 40 + 2);
        assert_eq!(value, 42);
        assert!(elapsed < Duration::from_millis(100));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pin_rejects_out_of_range_core() {
        let err = pin_to_cpu(libc::CPU_SETSIZE as usize).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(pin_to_cpu(usize::MAX).is_err());
    }

    #[test]
    fn test_cycle_counter() {
        if HAS_CYCLE_COUNTER {
            let a = read_cycles();
            let b = read_cycles();
            assert!(b >= a, "cycle counter should be monotonic");
        }
    }
}
