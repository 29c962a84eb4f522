//! Reconstruction of the main chain from the unordered block index.

use crate::{BlockIndexEntry, Error, Result};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Chooses the tip when the highest height holds more than one entry.
///
/// There is no chain to follow at that point, the block index alone does not carry the
/// cumulative work needed to pick the best tip.
pub trait TipSelector {
    /// Returns the index of the chosen entry in `candidates`, which holds at least two entries
    /// in input order.
    fn select(&self, candidates: &[&BlockIndexEntry]) -> usize;
}

impl<F> TipSelector for F
where
    F: Fn(&[&BlockIndexEntry]) -> usize,
{
    fn select(&self, candidates: &[&BlockIndexEntry]) -> usize {
        self(candidates)
    }
}

/// Picks the first candidate in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl TipSelector for FirstCandidate {
    fn select(&self, _candidates: &[&BlockIndexEntry]) -> usize {
        0
    }
}

/// Ranks failed candidates last, then prefers the highest validity level, then stored block data.
/// A failed candidate is still picked when every candidate has failed.
/// Remaining ties go to the first candidate in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferValid;

impl TipSelector for PreferValid {
    fn select(&self, candidates: &[&BlockIndexEntry]) -> usize {
        candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| {
                (
                    entry.status.is_failed(),
                    Reverse(entry.status.validity_level()),
                    !entry.status.have_data(),
                )
            })
            .map(|(index, _)| index)
            .unwrap_or_default()
    }
}

/// Blocks of the main chain, one per height, genesis first and tip last.
///
/// Every entry's `previous_hash` is the hash of the entry before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainChain(Vec<BlockIndexEntry>);

impl MainChain {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest block of the chain, the genesis block for a complete index.
    pub fn genesis(&self) -> Option<&BlockIndexEntry> {
        self.0.first()
    }

    pub fn tip(&self) -> Option<&BlockIndexEntry> {
        self.0.last()
    }

    /// Returns the block at `height`.
    pub fn get(&self, height: i32) -> Option<&BlockIndexEntry> {
        let first = self.genesis()?.height;
        let index = usize::try_from(height.checked_sub(first)?).ok()?;
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockIndexEntry> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[BlockIndexEntry] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<BlockIndexEntry> {
        self.0
    }
}

impl IntoIterator for MainChain {
    type Item = BlockIndexEntry;
    type IntoIter = std::vec::IntoIter<BlockIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MainChain {
    type Item = &'a BlockIndexEntry;
    type IntoIter = std::slice::Iter<'a, BlockIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Assembles the main chain out of block index entries.
///
/// Heights are walked from the highest down to the lowest. Below the tip, the entry chosen at
/// each height must be the parent of the entry chosen one height above; when several entries
/// qualify the first one in input order is taken.
#[derive(Debug, Clone, Default)]
pub struct MainChainReconstructor<T = FirstCandidate> {
    tip_selector: T,
}

impl MainChainReconstructor {
    /// Constructs a new instance of [`MainChainReconstructor`] using [`FirstCandidate`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: TipSelector> MainChainReconstructor<T> {
    /// Constructs a new instance of [`MainChainReconstructor`] with a custom tip policy.
    pub fn with_tip_selector(tip_selector: T) -> Self {
        Self { tip_selector }
    }

    /// Reconstructs the main chain.
    ///
    /// Fails with a consistency error if the chain cannot be followed down from the tip: a
    /// height without the expected parent, or a height without any entry.
    pub fn reconstruct(&self, entries: &[BlockIndexEntry]) -> Result<MainChain> {
        let mut blocks_at_height: BTreeMap<i32, Vec<&BlockIndexEntry>> = BTreeMap::new();
        for entry in entries {
            blocks_at_height.entry(entry.height).or_default().push(entry);
        }

        // Tip first.
        let mut chain: Vec<&BlockIndexEntry> = Vec::with_capacity(blocks_at_height.len());

        for (&height, candidates) in blocks_at_height.iter().rev() {
            let selected = match chain.last() {
                None => self.select_tip(height, candidates),
                Some(child) => {
                    let parent_height = child.height - 1;
                    if height != parent_height {
                        return Err(Error::MissingHeight {
                            height: parent_height,
                            child: child.hash,
                        });
                    }
                    select_parent(height, candidates, child)?
                }
            };
            chain.push(selected);
        }

        chain.reverse();

        let chain = MainChain(chain.into_iter().cloned().collect());

        if let Some(tip) = chain.tip() {
            tracing::debug!(
                "Reconstructed main chain of {} blocks out of {} entries, tip: #{},{}",
                chain.len(),
                entries.len(),
                tip.height,
                tip.hash
            );
        }

        Ok(chain)
    }

    fn select_tip<'a>(
        &self,
        height: i32,
        candidates: &[&'a BlockIndexEntry],
    ) -> &'a BlockIndexEntry {
        if let [only] = candidates {
            return *only;
        }

        let index = self.tip_selector.select(candidates);
        let tip = candidates.get(index).copied().unwrap_or_else(|| {
            tracing::warn!(
                "Tip selector returned index {index} for {} candidates, using the first",
                candidates.len()
            );
            candidates[0]
        });

        tracing::debug!(
            "{} candidate tips at height {height}, selected {}",
            candidates.len(),
            tip.hash
        );

        tip
    }
}

fn select_parent<'a>(
    height: i32,
    candidates: &[&'a BlockIndexEntry],
    child: &BlockIndexEntry,
) -> Result<&'a BlockIndexEntry> {
    let mut matching = candidates
        .iter()
        .copied()
        .filter(|candidate| candidate.hash == child.previous_hash);

    let Some(parent) = matching.next() else {
        return Err(match candidates {
            [only] => Error::BrokenLink {
                height,
                hash: only.hash,
                expected: child.previous_hash,
                child: child.hash,
            },
            _ => Error::MissingParent {
                height,
                expected: child.previous_hash,
                child: child.hash,
            },
        });
    };

    let duplicates = matching.count();
    if duplicates > 0 {
        tracing::warn!(
            "{} entries at height {height} have hash {}, using the first",
            duplicates + 1,
            parent.hash
        );
    }

    Ok(parent)
}

/// Reconstructs the main chain with the default tip policy, see [`MainChainReconstructor`].
pub fn reconstruct_main_chain(entries: &[BlockIndexEntry]) -> Result<MainChain> {
    MainChainReconstructor::new().reconstruct(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockStatus, ErrorKind, Hash256};

    fn hash(height: i32, branch: u8) -> Hash256 {
        let mut bytes = [0u8; 32];
        bytes[0] = branch;
        bytes[28..].copy_from_slice(&height.to_be_bytes());
        Hash256::new(bytes)
    }

    fn entry(height: i32, branch: u8, parent_branch: u8) -> BlockIndexEntry {
        BlockIndexEntry {
            hash: hash(height, branch),
            version: 250000,
            height,
            status: BlockStatus::from(5 | 8),
            tx_count: 1,
            file_number: 0,
            data_pos: 8,
            undo_pos: 0,
            block_version: 4,
            previous_hash: if height == 0 {
                Hash256::all_zeros()
            } else {
                hash(height - 1, parent_branch)
            },
            merkle_root: Hash256::all_zeros(),
            time: 0,
            bits: 0,
            nonce: 0,
        }
    }

    fn linear(len: i32) -> Vec<BlockIndexEntry> {
        (0..len).map(|height| entry(height, 0, 0)).collect()
    }

    fn assert_linked(chain: &MainChain) {
        for pair in chain.as_slice().windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash);
            assert_eq!(pair[1].height, pair[0].height + 1);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(reconstruct_main_chain(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unordered_linear_chain() {
        let mut entries = linear(50);
        fastrand::shuffle(&mut entries);
        let chain = reconstruct_main_chain(&entries).unwrap();
        assert_eq!(chain.len(), 50);
        assert_eq!(chain.genesis().unwrap().height, 0);
        assert_eq!(chain.tip().unwrap().height, 49);
        assert_eq!(chain.get(10).unwrap().hash, hash(10, 0));
        assert!(chain.get(50).is_none());
        assert!(chain.get(-1).is_none());
        assert_linked(&chain);
    }

    #[test]
    fn test_fork_below_tip_follows_parent() {
        let mut entries = linear(20);
        // Stale branch 1 forks off at height 9 and is two blocks long.
        entries.insert(0, entry(10, 1, 0));
        entries.insert(0, entry(11, 1, 1));

        let chain = reconstruct_main_chain(&entries).unwrap();
        assert_eq!(chain.len(), 20);
        assert_eq!(chain.get(10).unwrap().hash, hash(10, 0));
        assert_eq!(chain.get(11).unwrap().hash, hash(11, 0));
        assert_linked(&chain);
    }

    #[test]
    fn test_missing_parent_is_a_consistency_error() {
        let mut entries = linear(5);
        // Height 2 holds two blocks, neither is the parent of the block at height 3.
        entries[2] = entry(2, 7, 0);
        entries.push(entry(2, 8, 0));

        let err = reconstruct_main_chain(&entries).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert!(matches!(
            err,
            Error::MissingParent { height: 2, expected, .. } if expected == hash(2, 0)
        ));
    }

    #[test]
    fn test_unlinked_single_entry_is_a_consistency_error() {
        let mut entries = linear(5);
        entries[1] = entry(1, 3, 0);
        let err = reconstruct_main_chain(&entries).unwrap_err();
        assert!(matches!(err, Error::BrokenLink { height: 1, .. }));
    }

    #[test]
    fn test_gap_is_a_consistency_error() {
        let mut entries = linear(5);
        entries.remove(2);
        let err = reconstruct_main_chain(&entries).unwrap_err();
        assert!(matches!(err, Error::MissingHeight { height: 2, .. }));
    }

    #[test]
    fn test_duplicate_parents_take_the_first() {
        let mut entries = linear(5);
        let mut duplicate = entry(2, 0, 0);
        duplicate.tx_count = 99;
        entries.push(duplicate);
        let chain = reconstruct_main_chain(&entries).unwrap();
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.get(2).unwrap().tx_count, 1);
    }

    fn competing_tips() -> Vec<BlockIndexEntry> {
        let mut entries = linear(10);
        let mut failed = entry(10, 1, 0);
        failed.status = BlockStatus::from(3 | 8 | 32);
        let mut header_only = entry(10, 2, 0);
        header_only.status = BlockStatus::from(5);
        entries.extend([failed, header_only, entry(10, 0, 0)]);
        entries
    }

    #[test]
    fn test_first_candidate_tip_policy() {
        let chain = reconstruct_main_chain(&competing_tips()).unwrap();
        assert_eq!(chain.len(), 11);
        assert_eq!(chain.tip().unwrap().hash, hash(10, 1));
        assert_linked(&chain);
    }

    #[test]
    fn test_prefer_valid_tip_policy() {
        let chain = MainChainReconstructor::with_tip_selector(PreferValid)
            .reconstruct(&competing_tips())
            .unwrap();
        assert_eq!(chain.tip().unwrap().hash, hash(10, 0));
        assert_linked(&chain);
    }

    #[test]
    fn test_prefer_valid_ranks_failed_last() {
        let mut failed_scripts = entry(10, 1, 0);
        failed_scripts.status = BlockStatus::from(5 | 8 | 32);
        let mut failed_header = entry(10, 2, 0);
        failed_header.status = BlockStatus::from(1 | 64);

        assert_eq!(PreferValid.select(&[&failed_header, &failed_scripts]), 1);

        let healthy = entry(10, 0, 0);
        assert_eq!(
            PreferValid.select(&[&failed_scripts, &failed_header, &healthy]),
            2
        );
    }

    #[test]
    fn test_closure_tip_policy() {
        let last = |candidates: &[&BlockIndexEntry]| candidates.len() - 1;
        let chain = MainChainReconstructor::with_tip_selector(last)
            .reconstruct(&competing_tips())
            .unwrap();
        assert_eq!(chain.tip().unwrap().hash, hash(10, 0));

        let out_of_range = |_: &[&BlockIndexEntry]| 42usize;
        let chain = MainChainReconstructor::with_tip_selector(out_of_range)
            .reconstruct(&competing_tips())
            .unwrap();
        assert_eq!(chain.tip().unwrap().hash, hash(10, 1));
    }
}
