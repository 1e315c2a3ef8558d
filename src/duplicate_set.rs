//! Duplicate sets and the grouping of a record stream into them
//!
//! A duplicate set is the run of consecutive reads that share a molecule key,
//! i.e. the MI tag value with any trailing `/<strand>` suffix removed. Input is
//! expected in the grouped order produced by UMI grouping tools, so a set is
//! complete as soon as a read with a different key shows up.

use bstr::{BStr, BString, ByteSlice};
use std::io;

use crate::error::DownsampleError;

/// A read that carries a molecular identifier tag
pub trait MolecularTagged {
    /// Value of the MI tag, `Ok(None)` if the read has none
    fn molecular_id(&self) -> io::Result<Option<BString>>;

    /// Name used in error messages
    fn read_name(&self) -> String;
}

/// Fetch the MI value of a read, treating absence as malformed input
pub fn required_molecular_id<R: MolecularTagged>(read: &R) -> Result<BString, DownsampleError> {
    read.molecular_id()
        .map_err(|source| DownsampleError::MalformedTag {
            read: read.read_name(),
            source,
        })?
        .ok_or_else(|| DownsampleError::MissingMolecularId {
            read: read.read_name(),
        })
}

/// Strip the strand suffix from an MI value
///
/// `17/A` and `17/B` both map to `17`. Values without a `/` are their own key.
#[inline]
pub fn molecule_key(mi: &BStr) -> &BStr {
    match mi.rfind_byte(b'/') {
        Some(i) => mi[..i].as_bstr(),
        None => mi,
    }
}

/// Ordered, non-empty group of reads from one source molecule
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateSet<R> {
    reads: Vec<R>,
}

impl<R> DuplicateSet<R> {
    /// Returns `None` for an empty read list
    pub fn new(reads: Vec<R>) -> Option<Self> {
        if reads.is_empty() {
            None
        } else {
            Some(Self { reads })
        }
    }

    #[inline]
    pub fn reads(&self) -> &[R] {
        &self.reads
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Always false; sets are never empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

/// Groups consecutive reads sharing a molecule key into [`DuplicateSet`]s
///
/// Iteration stops after the first error.
pub struct DuplicateSets<I, R> {
    records: I,
    pending: Option<(BString, R)>,
    done: bool,
}

impl<I, R> DuplicateSets<I, R>
where
    I: Iterator<Item = io::Result<R>>,
    R: MolecularTagged,
{
    pub fn new(records: I) -> Self {
        Self {
            records,
            pending: None,
            done: false,
        }
    }

    fn next_keyed(&mut self) -> Option<Result<(BString, R), DownsampleError>> {
        let read = match self.records.next()? {
            Ok(read) => read,
            Err(e) => return Some(Err(DownsampleError::Input(e))),
        };
        Some(required_molecular_id(&read).map(|mi| (BString::from(molecule_key(mi.as_bstr())), read)))
    }

    fn fail(&mut self, e: DownsampleError) -> Option<Result<DuplicateSet<R>, DownsampleError>> {
        self.done = true;
        self.pending = None;
        Some(Err(e))
    }
}

impl<I, R> Iterator for DuplicateSets<I, R>
where
    I: Iterator<Item = io::Result<R>>,
    R: MolecularTagged,
{
    type Item = Result<DuplicateSet<R>, DownsampleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let (key, first) = match self.pending.take() {
            Some(pending) => pending,
            None => match self.next_keyed() {
                Some(Ok(keyed)) => keyed,
                Some(Err(e)) => return self.fail(e),
                None => {
                    self.done = true;
                    return None;
                }
            },
        };

        let mut reads = vec![first];
        loop {
            match self.next_keyed() {
                Some(Ok((k, read))) if k == key => reads.push(read),
                Some(Ok(next_set)) => {
                    self.pending = Some(next_set);
                    break;
                }
                Some(Err(e)) => return self.fail(e),
                None => break,
            }
        }

        Some(Ok(DuplicateSet { reads }))
    }
}
