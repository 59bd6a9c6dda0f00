use super::{Error, Segment, BLOCK_SIZE};

/*
    A growable byte buffer backing one program segment. The buffer is always a whole
    number of blocks long and zero-filled past `len`; it grows a block at a time and
    never shrinks.
*/
#[derive(Debug, Clone)]
pub struct Arena {
    segment: Segment,
    buf: Vec<u8>,
    len: usize,
}

impl Arena {
    pub fn with_capacity_for(segment: Segment, len: usize) -> Result<Self, Error> {
        let mut arena = Arena {
            segment,
            buf: Vec::new(),
            len: 0,
        };
        let capacity = (len / BLOCK_SIZE)
            .checked_add(1)
            .and_then(|blocks| blocks.checked_mul(BLOCK_SIZE))
            .ok_or(Error::Malformed(segment, len as u64))?;
        arena.grow_to(capacity)?;
        Ok(arena)
    }

    pub fn new(segment: Segment) -> Result<Self, Error> {
        Arena::with_capacity_for(segment, 0)
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn grow_to(&mut self, capacity: usize) -> Result<(), Error> {
        let extra = capacity - self.buf.len();
        self.buf
            .try_reserve_exact(extra)
            .map_err(|_| Error::Allocation(self.segment, capacity))?;
        self.buf.resize(capacity, 0);
        Ok(())
    }

    /// Make room for `additional` more bytes past `len`, in whole blocks.
    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let needed = self
            .len
            .checked_add(additional)
            .ok_or(Error::Allocation(self.segment, usize::MAX))?;
        if needed <= self.capacity() {
            return Ok(());
        }

        let blocks = (needed - self.capacity() + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let capacity = blocks
            .checked_mul(BLOCK_SIZE)
            .and_then(|extra| extra.checked_add(self.capacity()))
            .ok_or(Error::Allocation(self.segment, usize::MAX))?;
        self.grow_to(capacity)
    }

    /// Append `bytes`, returning the offset they were written at.
    pub fn push(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        self.reserve(bytes.len())?;
        let start = self.len;
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(start)
    }

    /// The uninitialized tail `len..len + n`, marked as used. Capacity must already
    /// be reserved.
    pub(super) fn fill(&mut self, n: usize) -> &mut [u8] {
        let start = self.len;
        self.len += n;
        &mut self.buf[start..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_block() {
        let arena = Arena::new(Segment::Code).unwrap();
        assert_eq!(arena.capacity(), BLOCK_SIZE);
        assert!(arena.is_empty());
    }

    #[test]
    fn load_rounds_past_length() {
        assert_eq!(
            Arena::with_capacity_for(Segment::Data, BLOCK_SIZE - 1)
                .unwrap()
                .capacity(),
            BLOCK_SIZE
        );
        assert_eq!(
            Arena::with_capacity_for(Segment::Data, BLOCK_SIZE)
                .unwrap()
                .capacity(),
            2 * BLOCK_SIZE
        );
    }

    #[test]
    fn oversized_length_is_malformed() {
        assert!(matches!(
            Arena::with_capacity_for(Segment::Data, usize::MAX),
            Err(Error::Malformed(Segment::Data, _))
        ));
    }

    #[test]
    fn oversized_reserve_fails() {
        let mut arena = Arena::new(Segment::Code).unwrap();
        arena.push(&[1]).unwrap();
        assert!(matches!(
            arena.reserve(usize::MAX),
            Err(Error::Allocation(Segment::Code, _))
        ));
        assert_eq!(arena.capacity(), BLOCK_SIZE);
    }

    #[test]
    fn grows_in_whole_blocks() {
        let mut arena = Arena::new(Segment::Data).unwrap();
        arena.push(&vec![1; BLOCK_SIZE - 8]).unwrap();
        assert_eq!(arena.capacity(), BLOCK_SIZE);

        let off = arena.push(&[2; 16]).unwrap();
        assert_eq!(off, BLOCK_SIZE - 8);
        assert_eq!(arena.capacity(), 2 * BLOCK_SIZE);
        assert_eq!(arena.len(), BLOCK_SIZE + 8);

        arena.push(&vec![3; 3 * BLOCK_SIZE]).unwrap();
        assert_eq!(arena.capacity(), 5 * BLOCK_SIZE);
        assert_eq!(arena.capacity() % BLOCK_SIZE, 0);
        assert_eq!(&arena.as_slice()[BLOCK_SIZE - 9..BLOCK_SIZE - 7], &[1, 2]);
    }
}
