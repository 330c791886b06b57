//! The code table both halves of the codec build independently.
//!
//! The table is pre-sized to [`MAX_ENTRIES`] and never reallocated. Its first 256 entries are
//! the literal bytes, every further entry extends an earlier one by a single byte.
//!
//! [`MAX_ENTRIES`]: ../constant.MAX_ENTRIES.html
use crate::alloc::{boxed::Box, vec, vec::Vec};
use crate::{Code, LITERAL_COUNT, MAX_CODESIZE, MAX_ENTRIES, MIN_CODESIZE};

use log::{debug, trace};

/// One table slot.
#[derive(Clone, Copy, Debug, Default)]
struct Entry {
    /// The sequence this entry extends, `None` for literals.
    prefix: Option<Code>,
    /// The trailing byte.
    byte: u8,
}

/// What [`Dictionary::grow_or_reset`] did to the code size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSwitch {
    /// The code size still covers the table.
    Keep,
    /// The code size grew by one bit.
    Grow,
    /// The table started a new generation at the minimum code size.
    Reset,
}

/// The fixed-capacity code table.
pub struct Dictionary {
    entries: Box<[Entry]>,
    /// Length of the sequence behind each code.
    depths: Box<[u16]>,
    /// Number of live entries.
    len: usize,
    /// Successor index for encoder lookups, absent on the decoding side.
    tree: Option<Tree>,
}

/// One tree node for at most each code.
/// To avoid using too much memory we keep nodes with few successors in optimized form. This form
/// doesn't offer lookup by indexing but instead does a linear search.
#[derive(Default)]
struct Tree {
    simples: Vec<Simple>,
    complex: Vec<Full>,
    keys: Vec<CompressedKey>,
}

#[derive(Clone, Copy)]
enum FullKey {
    NoSuccessor,
    Simple(u16),
    Full(u16),
}

#[derive(Clone, Copy)]
struct CompressedKey(u16);

const SHORT: usize = 16;

#[derive(Clone, Copy)]
struct Simple {
    codes: [Code; SHORT],
    chars: [u8; SHORT],
    count: u8,
}

#[derive(Clone, Copy)]
struct Full {
    char_continuation: [Code; 256],
}

impl SizeSwitch {
    /// Whether the table was emptied down to its literals.
    pub fn is_reset(self) -> bool {
        self == SizeSwitch::Reset
    }
}

impl Dictionary {
    /// A table holding only the 256 literal entries.
    ///
    /// Lookups through [`find_index`] scan the table. Use [`indexed`] when they are frequent.
    ///
    /// [`find_index`]: #method.find_index
    /// [`indexed`]: #method.indexed
    pub fn new() -> Self {
        let mut entries = vec![Entry::default(); MAX_ENTRIES].into_boxed_slice();
        let mut depths = vec![0; MAX_ENTRIES].into_boxed_slice();
        let literals = entries.iter_mut().zip(depths.iter_mut());
        for (byte, (entry, depth)) in (0..=u8::MAX).zip(literals) {
            *entry = Entry { prefix: None, byte };
            *depth = 1;
        }

        Dictionary {
            entries,
            depths,
            len: LITERAL_COUNT,
            tree: None,
        }
    }

    /// A literal-only table that also maintains a successor index for [`find_index`].
    ///
    /// [`find_index`]: #method.find_index
    pub fn indexed() -> Self {
        let mut tree = Tree::default();
        tree.init();
        Dictionary {
            tree: Some(tree),
            ..Self::new()
        }
    }

    /// Number of live entries, between 256 and 4096.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table only holds its literals.
    pub fn is_fresh(&self) -> bool {
        self.len == LITERAL_COUNT
    }

    /// Whether no further entry can be added.
    pub fn is_full(&self) -> bool {
        self.len >= MAX_ENTRIES
    }

    /// Whether `code` names a live entry.
    pub fn contains(&self, code: Code) -> bool {
        usize::from(code) < self.len
    }

    /// Drop every learned entry.
    pub fn reset(&mut self) {
        self.len = LITERAL_COUNT;
        if let Some(tree) = &mut self.tree {
            tree.reset();
        }
    }

    /// Find the entry extending `prefix` by `byte`.
    ///
    /// Without a prefix this is the literal for `byte`. Results match a linear scan over the
    /// live entries in code order.
    pub fn find_index(&self, prefix: Option<Code>, byte: u8) -> Option<Code> {
        match prefix {
            None => Some(Code::from(byte)),
            Some(code) if self.contains(code) => match &self.tree {
                Some(tree) => tree.at_key(code, byte),
                None => self.scan(code, byte),
            },
            Some(_) => None,
        }
    }

    fn scan(&self, prefix: Code, byte: u8) -> Option<Code> {
        let learned = &self.entries[LITERAL_COUNT..self.len];
        learned
            .iter()
            .position(|entry| entry.prefix == Some(prefix) && entry.byte == byte)
            .map(|index| (LITERAL_COUNT + index) as Code)
    }

    /// Append the entry `prefix` + `byte`.
    ///
    /// Fails when the table is full or when `prefix` is not a live entry. Every entry thus
    /// points at a lower code, which bounds each sequence by the table capacity.
    pub fn add(&mut self, prefix: Code, byte: u8) -> bool {
        if self.is_full() || !self.contains(prefix) {
            return false;
        }

        let code = self.len as Code;
        self.entries[self.len] = Entry {
            prefix: Some(prefix),
            byte,
        };
        self.depths[self.len] = self.depths[usize::from(prefix)] + 1;
        if let Some(tree) = &mut self.tree {
            let appended = tree.append(prefix, byte);
            debug_assert_eq!(appended, code);
        }
        self.len += 1;
        true
    }

    /// Length of the sequence behind `code`, zero for codes not in the table.
    pub fn depth(&self, code: Code) -> usize {
        if self.contains(code) {
            usize::from(self.depths[usize::from(code)])
        } else {
            0
        }
    }

    /// Write the sequence behind `code` to the front of `buf` and return it.
    ///
    /// The prefix chain is walked from the last byte back to the literal, filling the output
    /// from its end. Codes not in the table produce an empty sequence.
    ///
    /// # Panics
    ///
    /// If `buf` is shorter than the sequence. A buffer of [`MAX_ENTRIES`] bytes always suffices.
    ///
    /// [`MAX_ENTRIES`]: ../constant.MAX_ENTRIES.html
    pub fn reconstruct_into<'b>(&self, code: Code, buf: &'b mut [u8]) -> &'b [u8] {
        let depth = self.depth(code);
        assert!(
            depth <= buf.len(),
            "sequence of {} bytes exceeds the {} byte buffer",
            depth,
            buf.len()
        );

        let out = &mut buf[..depth];
        let mut code_iter = code;
        for ch in out.iter_mut().rev() {
            let entry = self.entries[usize::from(code_iter)];
            *ch = entry.byte;
            match entry.prefix {
                Some(prefix) => code_iter = prefix,
                None => break,
            }
        }

        out
    }

    /// The sequence behind `code` as an owned vector.
    pub fn reconstruct(&self, code: Code) -> Vec<u8> {
        let mut buf = vec![0; self.depth(code)];
        self.reconstruct_into(code, &mut buf);
        buf
    }

    /// Widen `code_size` once the table has reached `1 << code_size` entries.
    ///
    /// Widening past [`MAX_CODESIZE`] instead resets the table to its literals and the code size
    /// to [`MIN_CODESIZE`]. The decision depends on the entry count alone, which is what keeps
    /// encoder and decoder in step.
    ///
    /// [`MAX_CODESIZE`]: ../constant.MAX_CODESIZE.html
    /// [`MIN_CODESIZE`]: ../constant.MIN_CODESIZE.html
    pub fn grow_or_reset(&mut self, code_size: &mut u8) -> SizeSwitch {
        if self.len != 1usize << *code_size {
            return SizeSwitch::Keep;
        }

        *code_size += 1;
        if *code_size > MAX_CODESIZE {
            debug!("dictionary full at {} entries, starting a new generation", self.len);
            self.reset();
            *code_size = MIN_CODESIZE;
            SizeSwitch::Reset
        } else {
            trace!("code size grows to {} bits at {} entries", code_size, self.len);
            SizeSwitch::Grow
        }
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    fn init(&mut self) {
        self.keys.resize(LITERAL_COUNT, FullKey::NoSuccessor.into());
    }

    fn reset(&mut self) {
        self.simples.clear();
        self.complex.clear();
        self.keys.truncate(LITERAL_COUNT);
        for k in self.keys.iter_mut() {
            *k = FullKey::NoSuccessor.into();
        }
    }

    fn at_key(&self, code: Code, ch: u8) -> Option<Code> {
        let key = *self.keys.get(usize::from(code))?;
        match FullKey::from(key) {
            FullKey::NoSuccessor => None,
            FullKey::Simple(idx) => {
                let nexts = &self.simples[usize::from(idx)];
                let successors = nexts
                    .codes
                    .iter()
                    .zip(nexts.chars.iter())
                    .take(usize::from(nexts.count));
                for (&scode, &sch) in successors {
                    if sch == ch {
                        return Some(scode);
                    }
                }

                None
            }
            FullKey::Full(idx) => {
                let full = &self.complex[usize::from(idx)];
                let precode = full.char_continuation[usize::from(ch)];
                if usize::from(precode) < MAX_ENTRIES {
                    Some(precode)
                } else {
                    None
                }
            }
        }
    }

    /// Register `ch` as a successor of `code`, returning the new code.
    ///
    /// When a pair is registered twice the lower code keeps winning lookups.
    fn append(&mut self, code: Code, ch: u8) -> Code {
        let next: Code = self.keys.len() as u16;
        let key = self.keys[usize::from(code)];
        match FullKey::from(key) {
            FullKey::NoSuccessor => {
                let new_key = FullKey::Simple(self.simples.len() as u16);
                let mut simple = Simple::default();
                simple.codes[0] = next;
                simple.chars[0] = ch;
                simple.count = 1;
                self.simples.push(simple);
                self.keys[usize::from(code)] = new_key.into();
            }
            FullKey::Simple(idx) if usize::from(self.simples[usize::from(idx)].count) < SHORT => {
                let nexts = &mut self.simples[usize::from(idx)];
                let nidx = usize::from(nexts.count);
                nexts.chars[nidx] = ch;
                nexts.codes[nidx] = next;
                nexts.count += 1;
            }
            FullKey::Simple(idx) => {
                let new_key = FullKey::Full(self.complex.len() as u16);
                let simples = &self.simples[usize::from(idx)];
                let mut full = Full {
                    char_continuation: [Code::MAX; 256],
                };
                let successors = simples.chars.iter().zip(simples.codes.iter());
                for (&pch, &pcont) in successors.chain(Some((&ch, &next))) {
                    full.set_if_vacant(pch, pcont);
                }
                self.complex.push(full);
                self.keys[usize::from(code)] = new_key.into();
            }
            FullKey::Full(idx) => {
                self.complex[usize::from(idx)].set_if_vacant(ch, next);
            }
        }
        self.keys.push(FullKey::NoSuccessor.into());
        next
    }
}

impl Full {
    fn set_if_vacant(&mut self, ch: u8, code: Code) {
        let slot = &mut self.char_continuation[usize::from(ch)];
        if usize::from(*slot) >= MAX_ENTRIES {
            *slot = code;
        }
    }
}

impl Default for Simple {
    fn default() -> Self {
        Simple {
            codes: [0; SHORT],
            chars: [0; SHORT],
            count: 0,
        }
    }
}

impl From<CompressedKey> for FullKey {
    fn from(CompressedKey(key): CompressedKey) -> Self {
        match (key >> MAX_CODESIZE) & 0xf {
            0 => FullKey::Full(key & 0xfff),
            1 => FullKey::Simple(key & 0xfff),
            _ => FullKey::NoSuccessor,
        }
    }
}

impl From<FullKey> for CompressedKey {
    fn from(full: FullKey) -> Self {
        CompressedKey(match full {
            FullKey::NoSuccessor => 0x2000,
            FullKey::Simple(code) => 0x1000 | code,
            FullKey::Full(code) => code,
        })
    }
}
