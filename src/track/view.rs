use super::hits::{Hit, VpHit};
use crate::error::TrackError;
use crate::event::{EventStore, McParticle, RawTrack, State, StateLocation, TrackType};
use nalgebra::Vector3;
use std::cell::OnceCell;

/// State location used as the reference point for each track topology.
pub fn reference_location(track_type: TrackType) -> StateLocation {
    match track_type {
        TrackType::Velo | TrackType::Backward => StateLocation::ClosestToBeam,
        TrackType::Downstream | TrackType::Long | TrackType::Ttrack | TrackType::Upstream => {
            StateLocation::FirstMeasurement
        }
    }
}

/// Read-only view over one reconstructed track of the current event.
///
/// Hit classification and the truth lookup run at most once per view; the
/// remaining accessors are plain reads of the underlying track.
pub struct TrackView<'a, S: EventStore + ?Sized> {
    raw: &'a RawTrack,
    store: &'a S,
    hits: OnceCell<Vec<Hit>>,
    truth: OnceCell<Option<&'a McParticle>>,
}

impl<'a, S: EventStore + ?Sized> TrackView<'a, S> {
    pub fn new(raw: &'a RawTrack, store: &'a S) -> Self {
        Self {
            raw,
            store,
            hits: OnceCell::new(),
            truth: OnceCell::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> u32 {
        self.raw.key
    }

    #[inline]
    pub fn track_type(&self) -> TrackType {
        self.raw.track_type
    }

    pub fn raw(&self) -> &'a RawTrack {
        self.raw
    }

    /// State selected by the topology lookup; never substitutes another one.
    pub fn state_at_reference(&self) -> Result<&'a State, TrackError> {
        let location = reference_location(self.raw.track_type);
        self.raw
            .state_at(location)
            .ok_or(TrackError::MissingState {
                track_key: self.raw.key,
                location,
            })
    }

    pub fn hits(&self) -> Result<&[Hit], TrackError> {
        if let Some(hits) = self.hits.get() {
            return Ok(hits.as_slice());
        }
        let classified = self
            .raw
            .lhcb_ids
            .iter()
            .map(|&id| Hit::classify(self.raw.key, id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.hits.get_or_init(|| classified).as_slice())
    }

    pub fn vp_hits(&self) -> Result<impl Iterator<Item = &VpHit>, TrackError> {
        Ok(self.hits()?.iter().filter_map(Hit::as_vp))
    }

    pub fn n_vp_hits(&self) -> Result<usize, TrackError> {
        Ok(self.vp_hits()?.count())
    }

    /// Linked truth particle: none, exactly one, or an error when the
    /// association table is ambiguous.
    pub fn truth_particle(&self) -> Result<Option<&'a McParticle>, TrackError> {
        if let Some(truth) = self.truth.get() {
            return Ok(*truth);
        }
        let links = self.store.truth_links(self.raw.key);
        let store: &'a S = self.store;
        let found = match links {
            [] => None,
            [particle_key] => Some(store.mc_particle(*particle_key).ok_or(
                TrackError::DanglingTruthLink {
                    track_key: self.raw.key,
                    particle_key: *particle_key,
                },
            )?),
            _ => {
                return Err(TrackError::AmbiguousTruthLink {
                    track_key: self.raw.key,
                    count: links.len(),
                })
            }
        };
        Ok(*self.truth.get_or_init(|| found))
    }

    /// Slope angle in the x-z plane of the reference state.
    pub fn rx(&self) -> Result<f64, TrackError> {
        Ok(self.state_at_reference()?.tx.atan2(1.0))
    }

    /// Slope angle in the y-z plane of the reference state.
    pub fn ry(&self) -> Result<f64, TrackError> {
        Ok(self.state_at_reference()?.ty.atan2(1.0))
    }

    #[inline]
    pub fn momentum(&self) -> Vector3<f64> {
        self.raw.momentum
    }

    #[inline]
    pub fn p(&self) -> f64 {
        self.raw.momentum.norm()
    }

    #[inline]
    pub fn pt(&self) -> f64 {
        self.raw.momentum.x.hypot(self.raw.momentum.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventRecord, MemoryEventStore, TruthLink};
    use crate::track::hits::{ids, pack_lhcb_id, VpChannelId};
    use nalgebra::Point3;

    fn state(location: StateLocation) -> State {
        State {
            location,
            position: Point3::new(0.1, 0.2, 10.0),
            tx: 0.01,
            ty: -0.02,
            qop: 1e-4,
            covariance: None,
        }
    }

    fn track(key: u32, track_type: TrackType, states: Vec<State>, ids: Vec<u32>) -> RawTrack {
        RawTrack {
            key,
            track_type,
            states,
            momentum: Vector3::new(300.0, 400.0, 10_000.0),
            lhcb_ids: ids,
        }
    }

    fn particle(key: u32) -> McParticle {
        McParticle {
            key,
            pid: 321,
            momentum: Vector3::new(0.0, 0.0, 5000.0),
            origin_vertex: Point3::origin(),
            end_vertices: Vec::new(),
            mother: None,
        }
    }

    fn store_with(links: &[(u32, u32)], particles: &[u32]) -> MemoryEventStore {
        let mut event = EventRecord::new(1, 1);
        event.truth_links = links
            .iter()
            .map(|&(track_key, particle_key)| TruthLink {
                track_key,
                particle_key,
            })
            .collect();
        event.mc_particles = particles.iter().map(|&k| particle(k)).collect();
        let mut store = MemoryEventStore::from_events([event]);
        store.advance().unwrap();
        store
    }

    #[test]
    fn reference_state_follows_topology() {
        let store = store_with(&[], &[]);
        let long = track(
            1,
            TrackType::Long,
            vec![state(StateLocation::ClosestToBeam), state(StateLocation::FirstMeasurement)],
            vec![],
        );
        let view = TrackView::new(&long, &store);
        assert_eq!(
            view.state_at_reference().unwrap().location,
            StateLocation::FirstMeasurement
        );

        let velo = track(2, TrackType::Velo, vec![state(StateLocation::FirstMeasurement)], vec![]);
        let view = TrackView::new(&velo, &store);
        assert!(matches!(
            view.state_at_reference(),
            Err(TrackError::MissingState {
                track_key: 2,
                location: StateLocation::ClosestToBeam
            })
        ));
    }

    #[test]
    fn hits_are_classified_once() {
        let store = store_with(&[], &[]);
        let ch = VpChannelId::from_parts(8, 0, 1, 1);
        let raw = track(3, TrackType::Long, vec![], vec![ids::vp(ch), ids::ut(5), ids::ft(6)]);
        let view = TrackView::new(&raw, &store);
        let first = view.hits().unwrap().as_ptr();
        assert_eq!(view.hits().unwrap().as_ptr(), first);
        assert_eq!(view.n_vp_hits().unwrap(), 1);
        assert_eq!(view.vp_hits().unwrap().next().unwrap().channel, ch);
    }

    #[test]
    fn unknown_subdetector_is_an_error() {
        let store = store_with(&[], &[]);
        let raw = track(4, TrackType::Long, vec![], vec![pack_lhcb_id(13, 7)]);
        let view = TrackView::new(&raw, &store);
        assert!(matches!(
            view.hits(),
            Err(TrackError::UnrecognisedHit { track_key: 4, .. })
        ));
    }

    #[test]
    fn truth_lookup_respects_link_count() {
        let store = store_with(&[(1, 10), (2, 10), (2, 11)], &[10, 11]);
        let none = track(0, TrackType::Long, vec![], vec![]);
        let one = track(1, TrackType::Long, vec![], vec![]);
        let two = track(2, TrackType::Long, vec![], vec![]);

        assert!(TrackView::new(&none, &store).truth_particle().unwrap().is_none());
        assert_eq!(
            TrackView::new(&one, &store).truth_particle().unwrap().unwrap().key,
            10
        );
        assert!(matches!(
            TrackView::new(&two, &store).truth_particle(),
            Err(TrackError::AmbiguousTruthLink {
                track_key: 2,
                count: 2
            })
        ));
    }

    #[test]
    fn slope_angles_and_momentum() {
        let store = store_with(&[], &[]);
        let raw = track(5, TrackType::Velo, vec![state(StateLocation::ClosestToBeam)], vec![]);
        let view = TrackView::new(&raw, &store);
        assert!((view.rx().unwrap() - 0.01f64.atan()).abs() < 1e-15);
        assert!((view.ry().unwrap() + 0.02f64.atan()).abs() < 1e-15);
        assert!((view.pt() - 500.0).abs() < 1e-9);
        assert!(view.p() > 10_000.0);
    }
}
