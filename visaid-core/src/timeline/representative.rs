//! Representative-instant resolution.
//!
//! A detected frame may carry several timepoints flagged as representative.
//! Exactly one must become the frame's nominal sample point, and the choice
//! has to be stable across runs. The pinned rule is the middle candidate:
//! sort by instant and take index `(count - 1) / 2` (lower middle for even
//! counts). Representative annotations cluster near frame edges under some
//! detectors, so the middle candidate tracks the frame's steady-state
//! content better than the first or last would.

use crate::error::{CoreError, CoreResult};

/// One candidate representative instant for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepCandidate {
    /// Annotation id of the timepoint.
    pub id: String,
    /// The instant, in milliseconds.
    pub time: i64,
    /// The fine-grained label at that instant.
    pub label: String,
}

/// Picks the middle candidate by instant.
///
/// Every extracted frame must offer at least one candidate; an empty list is
/// a contract violation by the extraction adapter, identified by `frame_id`
/// in the error.
pub fn choose_representative<'a>(
    candidates: &'a [RepCandidate],
    frame_id: &str,
) -> CoreResult<&'a RepCandidate> {
    if candidates.is_empty() {
        return Err(CoreError::Contract(format!(
            "frame '{frame_id}' has no representative candidates"
        )));
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by_key(|&i| candidates[i].time);
    Ok(&candidates[order[(order.len() - 1) / 2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, time: i64) -> RepCandidate {
        RepCandidate {
            id: id.to_string(),
            time,
            label: "frame".to_string(),
        }
    }

    #[test]
    fn test_single_candidate() {
        let candidates = vec![candidate("tp_1", 500)];
        let rep = choose_representative(&candidates, "tf1").unwrap();
        assert_eq!(rep.id, "tp_1");
    }

    #[test]
    fn test_odd_count_picks_exact_middle() {
        let candidates = vec![
            candidate("tp_1", 100),
            candidate("tp_2", 200),
            candidate("tp_3", 300),
        ];
        let rep = choose_representative(&candidates, "tf1").unwrap();
        assert_eq!(rep.id, "tp_2");
    }

    #[test]
    fn test_even_count_picks_lower_middle() {
        let candidates = vec![
            candidate("tp_1", 100),
            candidate("tp_2", 200),
            candidate("tp_3", 300),
            candidate("tp_4", 400),
        ];
        let rep = choose_representative(&candidates, "tf1").unwrap();
        assert_eq!(rep.id, "tp_2");
    }

    #[test]
    fn test_unsorted_candidates() {
        let candidates = vec![
            candidate("tp_3", 300),
            candidate("tp_1", 100),
            candidate("tp_2", 200),
        ];
        let rep = choose_representative(&candidates, "tf1").unwrap();
        assert_eq!(rep.id, "tp_2");
    }

    #[test]
    fn test_empty_candidates_is_contract_violation() {
        let err = choose_representative(&[], "tf9").unwrap_err();
        assert!(matches!(err, CoreError::Contract(_)));
        assert!(err.to_string().contains("tf9"));
    }
}
