//! Wall-clock timing around a single unit of work.
//!
//! Only the successful path is timed: [`timed_result`] and
//! [`timed_async`] hand an `Err` back unchanged.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;

/// A value together with the time it took to produce it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timed<T> {
    pub value: T,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl<T> Timed<T> {
    /// Elapsed time in fractional milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            value: f(self.value),
            elapsed: self.elapsed,
        }
    }
}

/// Run `f` and record how long it took.
pub fn timed<T>(f: impl FnOnce() -> T) -> Timed<T> {
    let start = Instant::now();
    let value = f();
    Timed {
        value,
        elapsed: start.elapsed(),
    }
}

/// Run a fallible `f`, timing it on success and propagating its error.
pub fn timed_result<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<Timed<T>, E> {
    let start = Instant::now();
    let value = f()?;
    Ok(Timed {
        value,
        elapsed: start.elapsed(),
    })
}

/// Async counterpart of [`timed_result`].
pub async fn timed_async<T, E, F>(fut: F) -> Result<Timed<T>, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let value = fut.await?;
    Ok(Timed {
        value,
        elapsed: start.elapsed(),
    })
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_elapsed_time() {
        let t = timed(|| {
            std::thread::sleep(Duration::from_millis(20));
            7
        });
        assert_eq!(t.value, 7);
        assert!(t.elapsed >= Duration::from_millis(20));
        assert!(t.elapsed_ms() >= 20.0);
    }

    #[test]
    fn empty_result_is_still_timed() {
        let t = timed(String::new);
        assert!(t.value.is_empty());
        // Elapsed is present even for an empty result.
        let json = serde_json::to_value(&t).unwrap();
        assert!(json["elapsed"].is_number());
    }

    #[test]
    fn error_propagates_unchanged() {
        let result: Result<Timed<u8>, &str> = timed_result(|| Err("compiler exploded"));
        assert_eq!(result.unwrap_err(), "compiler exploded");
    }

    #[test]
    fn map_keeps_elapsed() {
        let t = timed(|| 2).map(|v| v * 10);
        assert_eq!(t.value, 20);
    }

    #[tokio::test]
    async fn async_success_and_failure() {
        let ok = timed_async(async { Ok::<_, String>("out") }).await.unwrap();
        assert_eq!(ok.value, "out");

        let err = timed_async(async { Err::<(), _>("boom".to_string()) }).await;
        assert_eq!(err.unwrap_err(), "boom");
    }
}
