//! Mapping of per-file transfer progress onto the lease percentage.

use ovfdeploy_transfer::TransferProgress;
use ovfdeploy_vim::FileItem;

/// Percentage reported once the lease is ready, before any byte moves.
pub const START_PERCENT: u8 = 5;

/// Width of the band file transfers are spread across (5 to 95).
pub const TRANSFER_BAND: u8 = 90;

pub const DONE_PERCENT: u8 = 100;

/// Splits the transfer band between the files of one import.
///
/// Each file owns a slice proportional to its size hint when every file has
/// one; otherwise all slices are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPlan {
    weights: Vec<u64>,
    sum: u64,
}

impl ProgressPlan {
    pub fn new(items: &[FileItem]) -> Self {
        let sizes: Option<Vec<u64>> = items.iter().map(|i| i.size).collect();
        let weights = match sizes {
            Some(sizes) if sizes.iter().sum::<u64>() > 0 => sizes,
            _ => vec![1; items.len()],
        };
        let sum = weights.iter().sum();
        Self { weights, sum }
    }

    /// Overall percentage while file `index` is at `progress`.
    ///
    /// With an unknown or zero total the file's slice start is returned.
    pub fn percent(&self, index: usize, progress: TransferProgress) -> u8 {
        if self.sum == 0 || index >= self.weights.len() {
            return START_PERCENT;
        }
        let before: u128 = self.weights[..index].iter().map(|&w| w as u128).sum();
        let weight = self.weights[index] as u128;
        let sum = self.sum as u128;
        let band = TRANSFER_BAND as u128;

        let scaled = match progress.total {
            Some(total) if total > 0 => {
                let total = total as u128;
                let done = (progress.transferred as u128).min(total);
                (before * total + weight * done) * band / (sum * total)
            }
            _ => before * band / sum,
        };
        START_PERCENT + scaled.min(band) as u8
    }
}
