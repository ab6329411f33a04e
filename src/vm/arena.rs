/*!
Bidirectional bump arena backing the VM heap (spec.md §4.L / component L).

A single contiguous byte buffer split by two indices: permanent allocations and the
evaluation stack grow upward from zero (`low_mark`), temporary allocations descend from
the capacity (`high_mark`). `low_mark <= high_mark` is the only invariant; callers may not
allocate permanently while `running` (asserted, matching spec.md's "any attempt during
execution asserts").
*/
use super::error_plane::VmErrorCode;

const ALIGN: usize = 8;

fn align_up(x: usize) -> usize {
    (x + (ALIGN - 1)) & !(ALIGN - 1)
}

/// An offset into the arena's backing buffer, in bytes from the start.
pub type ArenaOffset = usize;

#[derive(Debug)]
pub struct Arena {
    buf: Vec<u8>,
    /// Next free byte for permanent (low) allocations; also the top of the eval stack.
    low_mark: usize,
    /// Next free byte for temporary (high) allocations, counted from the end.
    high_mark: usize,
    /// Set while a VM execution is in progress; gates permanent allocation.
    running: bool,
}

impl Arena {
    /// `size` is the total `stack + heap` byte budget; spec.md requires >= 8 KiB.
    pub fn new(size: usize) -> Self {
        let size = size.max(8 * 1024);
        Arena {
            buf: vec![0u8; size],
            low_mark: 0,
            high_mark: size,
            running: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn low_mark(&self) -> usize {
        self.low_mark
    }

    pub fn high_mark(&self) -> usize {
        self.high_mark
    }

    /// Bytes currently free between the two marks.
    pub fn free(&self) -> usize {
        self.high_mark.saturating_sub(self.low_mark)
    }

    /// Mark the arena as mid-`Exec`. Resets the temporary (high) region, matching
    /// spec.md: "On execution, temp high mark resets to heap size."
    pub fn begin_exec(&mut self) {
        self.high_mark = self.buf.len();
        self.running = true;
    }

    pub fn end_exec(&mut self) {
        self.running = false;
    }

    /// Permanent allocation: grows `low_mark` upward. Only legal outside execution.
    pub fn perm_alloc(&mut self, len: usize) -> Result<ArenaOffset, VmErrorCode> {
        assert!(
            !self.running,
            "permanent allocation attempted during VM execution"
        );
        let len = align_up(len);
        if self.low_mark + len > self.high_mark {
            return Err(VmErrorCode::HeapExhausted);
        }
        let off = self.low_mark;
        self.low_mark += len;
        Ok(off)
    }

    /// Temporary allocation: descends `high_mark`. Legal only during execution, but not
    /// enforced here since match-record emission needs it mid-exec exclusively.
    pub fn temp_alloc(&mut self, len: usize) -> Result<ArenaOffset, VmErrorCode> {
        let len = align_up(len);
        if self.high_mark < self.low_mark + len {
            return Err(VmErrorCode::HeapExhausted);
        }
        self.high_mark -= len;
        Ok(self.high_mark)
    }

    /// Raw stack-region access used by the VM's evaluation stack, which lives between
    /// `low_mark` and `high_mark` while executing and is addressed by `si * size_of::<Slot>()`.
    pub fn stack_overflow_check(&self, stack_top_bytes: usize, grow_bytes: usize) -> bool {
        self.high_mark.saturating_sub(self.low_mark) < stack_top_bytes + grow_bytes
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub fn write_at(&mut self, offset: ArenaOffset, data: &[u8]) {
        self.buf[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn read_at(&self, offset: ArenaOffset, len: usize) -> &[u8] {
        &self.buf[offset..offset + len]
    }

    /// Release everything: equivalent to `Bgp_ClearVm`'s heap teardown.
    pub fn clear(&mut self) {
        self.low_mark = 0;
        self.high_mark = self.buf.len();
        self.running = false;
    }

    /// Reset only the temp region and matches list equivalent (`Bgp_ResetVm`): permanent
    /// allocations below `low_mark` survive.
    pub fn reset_temp(&mut self) {
        self.high_mark = self.buf.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perm_and_temp_allocations_dont_overlap() {
        let mut a = Arena::new(8192);
        let p = a.perm_alloc(16).unwrap();
        assert_eq!(p, 0);
        a.begin_exec();
        let t = a.temp_alloc(32).unwrap();
        assert!(t >= a.low_mark());
        assert!(t + 32 <= 8192);
        a.end_exec();
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut a = Arena::new(8192);
        let res = a.perm_alloc(8192);
        assert!(res.is_ok());
        let res2 = a.perm_alloc(8);
        assert_eq!(res2, Err(VmErrorCode::HeapExhausted));
    }

    #[test]
    fn perm_alloc_during_exec_asserts() {
        let mut a = Arena::new(8192);
        a.begin_exec();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            a.perm_alloc(8).ok();
        }));
        assert!(result.is_err());
    }

    #[test]
    fn reset_temp_keeps_permanent() {
        let mut a = Arena::new(8192);
        let p = a.perm_alloc(64).unwrap();
        a.begin_exec();
        a.temp_alloc(128).unwrap();
        a.reset_temp();
        assert_eq!(a.low_mark(), p + 64);
        assert_eq!(a.high_mark(), 8192);
    }

    #[test]
    fn minimum_size_is_8kib() {
        let a = Arena::new(100);
        assert_eq!(a.capacity(), 8192);
    }
}
