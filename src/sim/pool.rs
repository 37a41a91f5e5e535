//! Recycling container for short-lived simulation objects
//!
//! Slots are allocated once and then cycled between the active and free
//! partitions. Handles carry a generation so a handle kept past its release
//! is detected instead of silently aliasing the next occupant of the slot.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Per-activation state that must be wiped when an object goes back to the pool
pub trait Poolable {
    fn reset(&mut self);
}

/// Slot index plus generation; the only way entities are referenced across calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    item: T,
    generation: u32,
    active: bool,
}

/// Active/free partitioned pool.
///
/// Iteration over the active partition follows activation order, which keeps
/// every pass over the pool deterministic.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    active: Vec<u32>,
    capacity: Option<usize>,
}

impl<T: Poolable> Pool<T> {
    /// Create a pool. `capacity` is the hard ceiling on allocated slots (`None` = unbounded).
    pub fn new(name: &'static str, capacity: Option<usize>) -> Self {
        // Grow past this on demand rather than trusting a huge ceiling up front
        let reserve = capacity.unwrap_or(32).min(1024);
        Self {
            name,
            slots: Vec::with_capacity(reserve),
            free: Vec::with_capacity(reserve),
            active: Vec::with_capacity(reserve),
            capacity,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Activate `item` in a free slot, allocating a new slot only when none is free
    pub fn acquire(&mut self, item: T) -> Result<EntityHandle, SimError> {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.item = item;
                slot.active = true;
                index
            }
            None => {
                if let Some(capacity) = self.capacity {
                    if self.slots.len() >= capacity {
                        return Err(SimError::CapacityExceeded {
                            pool: self.name,
                            capacity,
                        });
                    }
                }
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    item,
                    generation: 0,
                    active: true,
                });
                log::trace!("{} pool grew to {}", self.name, self.slots.len());
                index
            }
        };
        self.active.push(index);
        Ok(EntityHandle {
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    /// Return an active object to the free partition, clearing its activation state
    pub fn release(&mut self, handle: EntityHandle) -> Result<(), SimError> {
        if !self.is_live(handle) {
            return Err(SimError::InvalidHandle(handle));
        }
        let slot = &mut self.slots[handle.index()];
        slot.item.reset();
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(pos) = self.active.iter().position(|&i| i == handle.index) {
            self.active.remove(pos);
        }
        self.free.push(handle.index);
        Ok(())
    }

    /// Force-recycle every active object, in activation order
    pub fn release_all(&mut self, mut on_release: impl FnMut(EntityHandle, &T)) {
        while let Some(&index) = self.active.first() {
            let handle = EntityHandle {
                index,
                generation: self.slots[index as usize].generation,
            };
            on_release(handle, &self.slots[index as usize].item);
            // Handle was built from the live slot, so this cannot fail
            let _ = self.release(handle);
        }
    }

    /// Whether `handle` refers to the current occupant of an active slot
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.active && slot.generation == handle.generation)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&T> {
        if self.is_live(handle) {
            Some(&self.slots[handle.index()].item)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        if self.is_live(handle) {
            Some(&mut self.slots[handle.index()].item)
        } else {
            None
        }
    }

    /// Active objects in activation order
    pub fn iter_active(&self) -> impl Iterator<Item = (EntityHandle, &T)> {
        self.active.iter().map(|&index| {
            let slot = &self.slots[index as usize];
            (
                EntityHandle {
                    index,
                    generation: slot.generation,
                },
                &slot.item,
            )
        })
    }

    /// Visit every active object mutably. The active set cannot change during the visit.
    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(EntityHandle, &mut T)) {
        for &index in &self.active {
            let slot = &mut self.slots[index as usize];
            let handle = EntityHandle {
                index,
                generation: slot.generation,
            };
            f(handle, &mut slot.item);
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of slots ever allocated (active + free)
    pub fn total_allocated(&self) -> usize {
        self.slots.len()
    }
}
