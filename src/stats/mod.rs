//! Aggregate views over reconciled transcriptions.

mod chars;
mod counts;
mod top;

pub use chars::{UserCharData, UserCharEntry};
pub use counts::{CountData, FormatData, PostTypeData, SubGammaData, UserGammaData};
pub use top::{compress_top, RankedEntry};

use crate::constants::UNCLASSIFIED_KEY;
use crate::done::DoneRecord;
use crate::transcription::Transcription;

/// Transcriptions per volunteer.
#[must_use]
pub fn user_gamma(transcriptions: &[Transcription]) -> UserGammaData {
    transcriptions
        .iter()
        .map(|tr| tr.username.as_str())
        .collect()
}

/// Done records per volunteer, regardless of whether their comment was found.
#[must_use]
pub fn user_gamma_from_dones(dones: &[DoneRecord]) -> UserGammaData {
    dones.iter().map(|done| done.username.as_str()).collect()
}

#[must_use]
pub fn user_chars(transcriptions: &[Transcription]) -> UserCharData {
    let mut data = UserCharData::new();
    for tr in transcriptions {
        data.accumulate(&tr.username, tr.characters());
    }
    data
}

#[must_use]
pub fn sub_gamma(transcriptions: &[Transcription]) -> SubGammaData {
    transcriptions
        .iter()
        .map(|tr| tr.subreddit.as_str())
        .collect()
}

/// Transcriptions per content type. Unclassified ones count under `"null"`.
#[must_use]
pub fn post_types(transcriptions: &[Transcription]) -> PostTypeData {
    transcriptions
        .iter()
        .map(|tr| tr.kind.as_deref().unwrap_or(UNCLASSIFIED_KEY))
        .collect()
}

/// Transcriptions per format. Unclassified ones count under `"null"`.
#[must_use]
pub fn formats(transcriptions: &[Transcription]) -> FormatData {
    transcriptions
        .iter()
        .map(|tr| tr.format.as_deref().unwrap_or(UNCLASSIFIED_KEY))
        .collect()
}

/// All aggregates of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub user_gamma: UserGammaData,
    pub user_chars: UserCharData,
    pub sub_gamma: SubGammaData,
    pub post_types: PostTypeData,
    pub formats: FormatData,
}

impl Aggregates {
    #[must_use]
    pub fn from_transcriptions(transcriptions: &[Transcription]) -> Self {
        Self {
            user_gamma: user_gamma(transcriptions),
            user_chars: user_chars(transcriptions),
            sub_gamma: sub_gamma(transcriptions),
            post_types: post_types(transcriptions),
            formats: formats(transcriptions),
        }
    }
}
