use std::thread::sleep;
use std::time::Duration;

/// Re-executes `f` after `interval` has elapsed until it succeeds or `max_attempts` is reached.
/// Returns the first successful result, or the latest error once the attempts are exhausted.
///
/// Deployment and packaging completion are observed by polling the control plane with this
/// helper: the closure returns `Err` while the resource is still transitioning.
pub fn retry<F, T, E>(max_attempts: usize, interval: Duration, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    let mut last_err = None;
    for _ in 0..max_attempts {
        match f() {
            Ok(result) => return Ok(result),
            Err(err) => {
                last_err = Some(err);
                sleep(interval);
            }
        }
    }
    Err(last_err.expect("some error must exist at this point"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_is_returned() {
        let result: Result<&str, &str> = retry(3, Duration::from_millis(5), || Ok("healthy"));
        assert_eq!(result, Ok("healthy"));
    }

    #[test]
    fn last_error_is_returned_when_attempts_are_exhausted() {
        let mut polls = 0;
        let result: Result<&str, String> = retry(3, Duration::from_millis(5), || {
            polls += 1;
            Err(format!("still creating ({polls})"))
        });
        assert_eq!(result, Err("still creating (3)".to_string()));
        assert_eq!(polls, 3);
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut polls = 0;
        let result = retry(5, Duration::from_millis(5), || {
            polls += 1;
            if polls < 3 { Err("transitioning") } else { Ok("healthy") }
        });
        assert_eq!(result, Ok("healthy"));
        assert_eq!(polls, 3);
    }
}
