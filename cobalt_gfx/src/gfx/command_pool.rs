/// Reference-counted arena of recorded commands
///
/// Records are addressed by typed handles. A record is shared by every
/// package that retains it and goes back to the free list, recycled, when the
/// last reference is released. Recycled records keep their allocations.

use std::fmt;
use std::marker::PhantomData;

/// Reset of a pooled record before it is handed out again
pub trait Recycle {
    /// Drop resource references and clear contents, keeping capacity
    fn recycle(&mut self);
}

/// Typed index of a record inside a `CommandPool<T>`
pub struct CmdHandle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CmdHandle<T> {
    fn new(index: u32) -> Self {
        Self { index, _marker: PhantomData }
    }

    pub fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for CmdHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CmdHandle<T> {}

impl<T> PartialEq for CmdHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for CmdHandle<T> {}

impl<T> fmt::Debug for CmdHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CmdHandle({})", self.index)
    }
}

struct Entry<T> {
    ref_count: u32,
    cmd: T,
}

/// Pool of one command type
pub struct CommandPool<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
}

impl<T: Recycle + Default> CommandPool<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Hand out a blank record with a reference count of one
    pub fn alloc(&mut self) -> CmdHandle<T> {
        if let Some(index) = self.free.pop() {
            self.entries[index as usize].ref_count = 1;
            return CmdHandle::new(index);
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            ref_count: 1,
            cmd: T::default(),
        });
        CmdHandle::new(index)
    }

    /// Live record behind `handle`
    pub fn get(&self, handle: CmdHandle<T>) -> Option<&T> {
        self.entries
            .get(handle.index as usize)
            .filter(|entry| entry.ref_count > 0)
            .map(|entry| &entry.cmd)
    }

    pub fn get_mut(&mut self, handle: CmdHandle<T>) -> Option<&mut T> {
        self.entries
            .get_mut(handle.index as usize)
            .filter(|entry| entry.ref_count > 0)
            .map(|entry| &mut entry.cmd)
    }

    /// Add a reference to a live record
    pub fn retain(&mut self, handle: CmdHandle<T>) -> bool {
        match self.entries.get_mut(handle.index as usize) {
            Some(entry) if entry.ref_count > 0 => {
                entry.ref_count += 1;
                true
            }
            _ => false,
        }
    }

    /// Drop a reference; returns true when the record went back to the pool
    pub fn release(&mut self, handle: CmdHandle<T>) -> bool {
        let Some(entry) = self.entries.get_mut(handle.index as usize) else {
            return false;
        };
        if entry.ref_count == 0 {
            return false;
        }
        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return false;
        }
        entry.cmd.recycle();
        self.free.push(handle.index);
        true
    }

    /// Current reference count (0 for free records)
    pub fn ref_count(&self, handle: CmdHandle<T>) -> u32 {
        self.entries
            .get(handle.index as usize)
            .map_or(0, |entry| entry.ref_count)
    }

    /// Records currently handed out
    pub fn live_count(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Records ever allocated, live or free
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

impl<T: Recycle + Default> Default for CommandPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "command_pool_tests.rs"]
mod tests;
