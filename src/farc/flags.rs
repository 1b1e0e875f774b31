//! Bit-field decoding for the archive and entry flag words.
//!
//! Bit 0 is the least significant bit of the big-endian word as read from
//! disk. Reserved bits keep their positional names so a dump of the flags
//! still shows everything that was set.

const fn bit(word: u32, index: u32) -> bool {
    (word >> index) & 1 == 1
}

/// Archive-level flags from header offset 8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveFlags {
    pub unk0: bool,
    pub gzip_compressed: bool,
    pub encrypted: bool,
    pub unk3: bool,
    pub unk4: bool,
    pub unk5: bool,
    pub zstd_compressed: bool,
    pub unk7: bool,
}

/// Per-entry flags, the last field of each entry table record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub unk0: bool,
    pub gzip_compressed: bool,
    pub encrypted: bool,
    pub unk3: bool,
    pub split_chunks: bool,
    pub zstd_compressed: bool,
}

pub fn decode_archive_flags(word: u32) -> ArchiveFlags {
    ArchiveFlags {
        unk0: bit(word, 0),
        gzip_compressed: bit(word, 1),
        encrypted: bit(word, 2),
        unk3: bit(word, 3),
        unk4: bit(word, 4),
        unk5: bit(word, 5),
        zstd_compressed: bit(word, 6),
        unk7: bit(word, 7),
    }
}

pub fn decode_entry_flags(word: u32) -> EntryFlags {
    EntryFlags {
        unk0: bit(word, 0),
        gzip_compressed: bit(word, 1),
        encrypted: bit(word, 2),
        unk3: bit(word, 3),
        split_chunks: bit(word, 4),
        zstd_compressed: bit(word, 5),
    }
}

impl EntryFlags {
    /// Re-encode the named bits, used for diagnostics.
    pub fn bits(&self) -> u32 {
        [
            self.unk0,
            self.gzip_compressed,
            self.encrypted,
            self.unk3,
            self.split_chunks,
            self.zstd_compressed,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &set)| acc | (u32::from(set) << i))
    }
}
