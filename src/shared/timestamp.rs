/// 订单时间戳
///
/// 订单创建时间只用于记录，不参与撮合优先级（优先级由价格档位内的
/// 插入顺序决定），因此热路径上使用批量刷新的缓存时间戳：
/// - 每 `REFRESH_INTERVAL` 次调用才读取一次系统时间
/// - 其余调用只做一次原子读取

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static CACHED_NANOS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static CALLS_SINCE_REFRESH: Cell<u32> = const { Cell::new(0) };
}

const REFRESH_INTERVAL: u32 = 100;

/// Nanoseconds since the Unix epoch, read straight from the system clock.
#[inline]
pub fn precise_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Cached nanosecond timestamp, refreshed every `REFRESH_INTERVAL` calls
/// per thread (and on the very first call, so it is never zero).
#[inline]
pub fn coarse_nanos() -> u64 {
    CALLS_SINCE_REFRESH.with(|calls| {
        let cached = CACHED_NANOS.load(Ordering::Relaxed);
        if cached == 0 || calls.get() >= REFRESH_INTERVAL {
            let now = precise_nanos();
            // fetch_max keeps the cache monotonic across threads
            let previous = CACHED_NANOS.fetch_max(now, Ordering::Relaxed);
            calls.set(0);
            now.max(previous)
        } else {
            calls.set(calls.get() + 1);
            cached
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_coarse_is_never_zero() {
        assert!(coarse_nanos() > 0);
    }

    #[test]
    fn test_coarse_is_monotonic_per_thread() {
        let mut last = coarse_nanos();
        for _ in 0..(REFRESH_INTERVAL * 3) {
            let ts = coarse_nanos();
            assert!(ts >= last);
            last = ts;
        }
    }

    #[test]
    fn test_coarse_catches_up_after_refresh() {
        let before = precise_nanos();
        thread::sleep(Duration::from_millis(2));
        // force at least one refresh
        for _ in 0..=REFRESH_INTERVAL {
            coarse_nanos();
        }
        assert!(coarse_nanos() > before);
    }
}
