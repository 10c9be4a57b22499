use crate::error::TrackError;
use crate::event::EventStore;
use crate::track::TrackView;
use std::collections::HashMap;

const PID_KAON: i32 = 321;
const PID_PION: i32 = 211;
const D_MOTHERS: [i32; 2] = [421, 413];

/// Indices into the track list of a truth-matched D*+ → D0(K+K-) π+ decay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DstarCandidate {
    pub kaon_plus: usize,
    pub kaon_minus: usize,
    pub pion: usize,
}

struct Matched {
    index: usize,
    mother: u32,
}

/// Truth-matched K+K-π triples sharing a D0 and a D* ancestor.
///
/// Tracks without truth or without a mother are ignored; an ambiguous truth
/// link is still an error.
pub fn find_dstar_candidates<S: EventStore + ?Sized>(
    store: &S,
    views: &[TrackView<'_, S>],
) -> Result<Vec<DstarCandidate>, TrackError> {
    let mut by_pid: HashMap<i32, Vec<Matched>> = HashMap::new();
    for (index, view) in views.iter().enumerate() {
        let Some(particle) = view.truth_particle()? else {
            continue;
        };
        let Some(mother) = particle.mother.and_then(|key| store.mc_particle(key)) else {
            continue;
        };
        if D_MOTHERS.contains(&mother.pid.abs()) {
            by_pid.entry(particle.pid).or_default().push(Matched {
                index,
                mother: mother.key,
            });
        }
    }

    let empty = Vec::new();
    let get = |pid: i32| by_pid.get(&pid).unwrap_or(&empty);
    let grandmother = |key: u32| store.mc_particle(key).and_then(|p| p.mother);

    let mut out = Vec::new();
    for pi in get(PID_PION).iter().chain(get(-PID_PION)) {
        for kp in get(PID_KAON) {
            for km in get(-PID_KAON) {
                if kp.mother != km.mother {
                    continue;
                }
                if grandmother(kp.mother) == Some(pi.mother) {
                    out.push(DstarCandidate {
                        kaon_plus: kp.index,
                        kaon_minus: km.index,
                        pion: pi.index,
                    });
                }
            }
        }
    }
    Ok(out)
}
