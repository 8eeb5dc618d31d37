use crate::fetch::{FetchError, Page, PageResponse};

use super::options::EmptyPageConditions;

/// What a settled fetch means for the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// A page of data arrived.
    Loaded(Page<T>),
    /// A benign "no more data" status; treated as an empty last page.
    Empty { status: u16 },
    /// The request was cancelled. Never surfaced to the user.
    Cancelled,
    /// A genuine failure.
    Failed(FetchError),
}

/// Sort a fetch result into cancelled / benign-empty / failed / loaded.
///
/// Cancellation is checked first, so a cancelled request is never reported
/// as a failure even when its error also carries a status.
pub fn classify<T>(
    result: Result<PageResponse<T>, FetchError>,
    page: u32,
    limit: u32,
    conditions: &EmptyPageConditions,
) -> FetchOutcome<T> {
    match result {
        Ok(response) => FetchOutcome::Loaded(response.into_page(page, limit)),
        Err(error) if error.is_cancellation() => FetchOutcome::Cancelled,
        Err(error) if conditions.matches(&error) => FetchOutcome::Empty {
            status: error.http_status().unwrap_or_default(),
        },
        Err(error) => FetchOutcome::Failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resolves_page() {
        let outcome = classify(
            Ok(PageResponse::new(vec![1, 2])),
            1,
            2,
            &EmptyPageConditions::none(),
        );
        match outcome {
            FetchOutcome::Loaded(page) => {
                assert_eq!(page.items, vec![1, 2]);
                assert!(page.has_next_page);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn cancellation_marker_is_cancelled() {
        let outcome = classify::<u8>(
            Err(FetchError::network("request aborted")),
            1,
            10,
            &EmptyPageConditions::none(),
        );
        assert_eq!(outcome, FetchOutcome::Cancelled);
    }

    #[test]
    fn configured_status_is_empty() {
        let conditions = EmptyPageConditions::statuses([400, 404]);
        let outcome = classify::<u8>(
            Err(FetchError::status(404, "Page out of range")),
            5,
            10,
            &conditions,
        );
        assert_eq!(outcome, FetchOutcome::Empty { status: 404 });
    }

    #[test]
    fn unconfigured_status_is_failure() {
        let conditions = EmptyPageConditions::statuses([404]);
        let outcome = classify::<u8>(
            Err(FetchError::status(500, "boom")),
            1,
            10,
            &conditions,
        );
        assert_eq!(outcome, FetchOutcome::Failed(FetchError::status(500, "boom")));
    }

    #[test]
    fn empty_conditions_never_match_non_status_errors() {
        let conditions = EmptyPageConditions::statuses([429]);
        assert!(!conditions.matches(&FetchError::RateLimited { retry_after: None }));
        assert!(!conditions.matches(&FetchError::network("down")));
        assert!(conditions.matches(&FetchError::status(429, "slow down")));
    }
}
