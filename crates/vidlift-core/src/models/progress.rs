//! Upload stages and the progress events emitted while an upload runs.

use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Start of the transfer band on the overall 0-100 scale
pub const TRANSFER_BAND_START: f64 = 10.0;
/// End of the transfer band on the overall 0-100 scale
pub const TRANSFER_BAND_END: f64 = 80.0;
/// End of the confirmation band on the overall 0-100 scale
pub const CONFIRM_BAND_END: f64 = 90.0;

/// Linear phases of one upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    RequestingCredential,
    Transferring,
    Confirming,
    Done,
}

impl UploadStage {
    /// Percent range owned by this stage on the overall scale.
    pub fn band(&self) -> (f64, f64) {
        match self {
            UploadStage::RequestingCredential => (0.0, TRANSFER_BAND_START),
            UploadStage::Transferring => (TRANSFER_BAND_START, TRANSFER_BAND_END),
            UploadStage::Confirming => (TRANSFER_BAND_END, CONFIRM_BAND_END),
            UploadStage::Done => (100.0, 100.0),
        }
    }

    /// Label shown when the stage starts
    pub fn label(&self) -> &'static str {
        match self {
            UploadStage::RequestingCredential => "Requesting upload URL...",
            UploadStage::Transferring => "Uploading to storage...",
            UploadStage::Confirming => "Confirming upload...",
            UploadStage::Done => "Upload completed!",
        }
    }
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStage::RequestingCredential => write!(f, "requesting_credential"),
            UploadStage::Transferring => write!(f, "transferring"),
            UploadStage::Confirming => write!(f, "confirming"),
            UploadStage::Done => write!(f, "done"),
        }
    }
}

/// Map a transport percent (0-100) onto the transfer band: `10 + p * 0.7`.
pub fn transfer_to_overall(transfer_percent: f64) -> f64 {
    let p = if transfer_percent.is_finite() {
        transfer_percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    TRANSFER_BAND_START + p * (TRANSFER_BAND_END - TRANSFER_BAND_START) / 100.0
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: UploadStage,
    pub stage_label: String,
    pub percent: f64,
}

impl ProgressEvent {
    pub fn new(stage: UploadStage, stage_label: impl Into<String>, percent: f64) -> Self {
        Self {
            stage,
            stage_label: stage_label.into(),
            percent,
        }
    }

    /// Event marking the start of a stage at the bottom of its band.
    pub fn stage_start(stage: UploadStage) -> Self {
        Self::new(stage, stage.label(), stage.band().0)
    }

    /// Event for a transport tick, already mapped onto the overall scale.
    pub fn transfer_tick(transfer_percent: f64) -> Self {
        Self::new(
            UploadStage::Transferring,
            format!("Uploading... {:.1}%", transfer_percent.clamp(0.0, 100.0)),
            transfer_to_overall(transfer_percent),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_transfer_mapping() {
        assert!(approx(transfer_to_overall(0.0), 10.0));
        assert!(approx(transfer_to_overall(50.0), 45.0));
        assert!(approx(transfer_to_overall(100.0), 80.0));
    }

    #[test]
    fn test_transfer_mapping_clamps() {
        assert!(approx(transfer_to_overall(-3.0), 10.0));
        assert!(approx(transfer_to_overall(250.0), 80.0));
        assert!(approx(transfer_to_overall(f64::NAN), 10.0));
    }

    #[test]
    fn test_bands_are_contiguous() {
        let stages = [
            UploadStage::RequestingCredential,
            UploadStage::Transferring,
            UploadStage::Confirming,
        ];
        for pair in stages.windows(2) {
            assert!(approx(pair[0].band().1, pair[1].band().0));
        }
        assert!(UploadStage::Confirming.band().1 <= 90.0);
    }

    #[test]
    fn test_transfer_tick_label() {
        let event = ProgressEvent::transfer_tick(50.0);
        assert_eq!(event.stage_label, "Uploading... 50.0%");
        assert!(approx(event.percent, 45.0));
    }

    #[test]
    fn test_done_label() {
        let event = ProgressEvent::stage_start(UploadStage::Done);
        assert_eq!(event.stage_label, "Upload completed!");
        assert!(approx(event.percent, 100.0));
    }
}
