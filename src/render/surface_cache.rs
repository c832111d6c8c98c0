use crate::foundation::core::SurfaceDesc;
use crate::foundation::error::{FilterChainError, FilterChainResult};
use crate::render::backend::RenderBackend;

/// One of the two cache slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotId {
    /// First slot; receives the first filter pass of every frame.
    A,
    /// Second slot.
    B,
}

impl SlotId {
    fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }

    /// The opposite slot.
    pub fn other(self) -> SlotId {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }
}

/// Counters describing cache activity since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceCacheStats {
    /// Surfaces created through the backend.
    pub allocations: u64,
    /// Surfaces dropped (reallocation, invalidation or context loss).
    pub releases: u64,
    /// `ensure` calls satisfied by the already cached surface.
    pub reuses: u64,
    /// Backend allocations that failed.
    pub failed_allocations: u64,
    /// Slots currently holding a surface.
    pub retained_surfaces: usize,
    /// Bytes held by the retained surfaces.
    pub retained_bytes: usize,
}

// Descriptor and surface are committed together so a slot is either empty or complete.
struct Backing<S> {
    desc: SurfaceDesc,
    surface: S,
}

/// Two reusable offscreen surfaces, reallocated when the requested descriptor changes.
///
/// Surfaces never leave the cache by value; borrows handed out by [`SurfaceCache::ensure`]
/// and [`SurfaceCache::split`] end with the frame that took them.
pub struct SurfaceCache<S> {
    slots: [Option<Backing<S>>; 2],
    generation: Option<u64>,
    stats: SurfaceCacheStats,
}

impl<S> Default for SurfaceCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SurfaceCache<S> {
    /// Empty cache.
    pub fn new() -> Self {
        Self {
            slots: [None, None],
            generation: None,
            stats: SurfaceCacheStats::default(),
        }
    }

    /// Activity counters plus current retention.
    pub fn stats(&self) -> SurfaceCacheStats {
        let mut st = self.stats;
        st.retained_surfaces = 0;
        st.retained_bytes = 0;
        for b in self.slots.iter().flatten() {
            st.retained_surfaces += 1;
            st.retained_bytes = st.retained_bytes.saturating_add(b.desc.byte_len());
        }
        st
    }

    /// Descriptor of the surface held in `slot`, if any.
    pub fn slot_desc(&self, slot: SlotId) -> Option<SurfaceDesc> {
        self.slots[slot.index()].as_ref().map(|b| b.desc)
    }

    /// Surface held in `slot`, if any.
    pub fn slot(&self, slot: SlotId) -> Option<&S> {
        self.slots[slot.index()].as_ref().map(|b| &b.surface)
    }

    /// Return the surface in `slot`, (re)allocating it when empty, stale or of a
    /// different descriptor.
    ///
    /// On allocation failure the slot is left empty.
    pub fn ensure<B>(
        &mut self,
        backend: &mut B,
        slot: SlotId,
        desc: &SurfaceDesc,
    ) -> FilterChainResult<&mut S>
    where
        B: RenderBackend<Surface = S>,
    {
        desc.validate()?;
        self.sync_context(backend.context_generation());

        let i = slot.index();
        let hit = matches!(&self.slots[i], Some(b) if b.desc == *desc);
        if hit {
            self.stats.reuses = self.stats.reuses.saturating_add(1);
        } else {
            if let Some(old) = self.slots[i].take() {
                self.release(slot, old);
            }
            match backend.create_surface(desc) {
                Ok(surface) => {
                    tracing::debug!(
                        ?slot,
                        width = desc.width,
                        height = desc.height,
                        "allocated cached surface"
                    );
                    self.stats.allocations = self.stats.allocations.saturating_add(1);
                    self.slots[i] = Some(Backing {
                        desc: *desc,
                        surface,
                    });
                    self.generation = Some(backend.context_generation());
                }
                Err(err) => {
                    tracing::warn!(?slot, error = %err, "cached surface allocation failed");
                    self.stats.failed_allocations =
                        self.stats.failed_allocations.saturating_add(1);
                    return Err(err);
                }
            }
        }

        self.slots[i]
            .as_mut()
            .map(|b| &mut b.surface)
            .ok_or_else(|| FilterChainError::allocation("cache slot empty after ensure"))
    }

    /// Ensure both slots hold a surface matching `desc`.
    pub fn ensure_pair<B>(&mut self, backend: &mut B, desc: &SurfaceDesc) -> FilterChainResult<()>
    where
        B: RenderBackend<Surface = S>,
    {
        self.ensure(backend, SlotId::A, desc)?;
        self.ensure(backend, SlotId::B, desc)?;
        Ok(())
    }

    /// Borrow `current` mutably and the other slot shared, for one ping-pong pass.
    ///
    /// Returns `None` unless both slots are populated.
    pub fn split(&mut self, current: SlotId) -> Option<(&mut S, &S)> {
        let [a, b] = &mut self.slots;
        let (cur, prev) = match current {
            SlotId::A => (a, b),
            SlotId::B => (b, a),
        };
        match (cur.as_mut(), prev.as_ref()) {
            (Some(c), Some(p)) => Some((&mut c.surface, &p.surface)),
            _ => None,
        }
    }

    /// Drop both surfaces. The next `ensure` allocates afresh.
    pub fn invalidate(&mut self) {
        for slot in [SlotId::A, SlotId::B] {
            if let Some(old) = self.slots[slot.index()].take() {
                self.release(slot, old);
            }
        }
        self.generation = None;
    }

    fn sync_context(&mut self, generation: u64) {
        if let Some(held) = self.generation
            && held != generation
        {
            tracing::debug!(held, generation, "rendering context changed, dropping cached surfaces");
            self.invalidate();
        }
    }

    fn release(&mut self, slot: SlotId, old: Backing<S>) {
        tracing::debug!(
            ?slot,
            width = old.desc.width,
            height = old.desc.height,
            "released cached surface"
        );
        self.stats.releases = self.stats.releases.saturating_add(1);
        drop(old);
    }
}

impl<S> std::fmt::Debug for SurfaceCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceCache")
            .field("a", &self.slot_desc(SlotId::A))
            .field("b", &self.slot_desc(SlotId::B))
            .field("generation", &self.generation)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_cache.rs"]
mod tests;
