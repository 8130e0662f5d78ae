//! Ladder collection: batched fan-out, payload normalization and the run itself.

mod batch;
mod normalize;
mod pipeline;

pub use batch::{BatchOptions, BatchProgress, partition_results, run_batched};
pub use normalize::{
    NormalizedMatch, RIOT_ID_SEPARATOR, decode_traits, decode_units, dedupe_match_ids,
    display_name, normalize_match, participant_for, player_record, unique_entries,
};
pub use pipeline::{CollectReport, Collector, Stage, start_collecting};

#[cfg(test)]
pub(crate) use normalize::tests::match_json;
