use bitflags::bitflags;

bitflags! {
    /// Validation and storage status of a block index entry.
    ///
    /// The low three bits hold the validity level (`VALID_HEADER` up to `VALID_SCRIPTS`) as a
    /// small integer, so those constants are not independent flags and must be compared through
    /// [`BlockStatus::validity_level`]. All the other bits are independent flags.
    ///
    /// https://github.com/bitcoin/bitcoin/blob/6f9db1ebcab4064065ccd787161bf2b87e03cc1f/src/chain.h#L90
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlockStatus: u32 {
        /// Parsed, version ok, hash satisfies claimed PoW, timestamp not in future.
        const VALID_HEADER = 1;
        /// All parent headers found, difficulty matches, timestamp >= median previous.
        const VALID_TREE = 2;
        /// Only first tx is coinbase, transactions valid, no duplicate txids, merkle root ok.
        const VALID_TRANSACTIONS = 3;
        /// Outputs do not overspend inputs, no double spends, coinbase output ok.
        const VALID_CHAIN = 4;
        /// Scripts and signatures ok.
        const VALID_SCRIPTS = 5;
        /// All validity bits.
        const VALID_MASK = Self::VALID_HEADER.bits()
            | Self::VALID_TREE.bits()
            | Self::VALID_TRANSACTIONS.bits()
            | Self::VALID_CHAIN.bits()
            | Self::VALID_SCRIPTS.bits();

        /// Full block available in `blk*.dat`.
        const HAVE_DATA = 8;
        /// Undo data available in `rev*.dat`.
        const HAVE_UNDO = 16;
        const HAVE_MASK = Self::HAVE_DATA.bits() | Self::HAVE_UNDO.bits();

        /// Stage after last reached validness failed.
        const FAILED_VALID = 32;
        /// Descends from a failed block.
        const FAILED_CHILD = 64;
        const FAILED_MASK = Self::FAILED_VALID.bits() | Self::FAILED_CHILD.bits();

        /// Block data in `blk*.dat` was received with a witness-enforcing client.
        const OPT_WITNESS = 128;

        // Bits unknown to this crate are kept as read.
        const _ = !0;
    }
}

impl BlockStatus {
    /// Returns the validity level stored in the low bits, `0` for none.
    pub fn validity_level(&self) -> u32 {
        self.bits() & Self::VALID_MASK.bits()
    }

    /// Whether the entry is valid up to `level` and not marked as failed.
    pub fn is_valid(&self, level: BlockStatus) -> bool {
        !self.is_failed() && self.validity_level() >= level.bits() & Self::VALID_MASK.bits()
    }

    /// Whether the block payload is stored in a data file.
    pub fn have_data(&self) -> bool {
        self.contains(Self::HAVE_DATA)
    }

    /// Whether the undo data is stored in an undo file.
    pub fn have_undo(&self) -> bool {
        self.contains(Self::HAVE_UNDO)
    }

    /// Whether either the block or the undo data is stored, i.e. the file number is recorded.
    pub fn have_any(&self) -> bool {
        self.intersects(Self::HAVE_MASK)
    }

    pub fn is_failed(&self) -> bool {
        self.intersects(Self::FAILED_MASK)
    }
}

impl From<u32> for BlockStatus {
    fn from(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }
}
