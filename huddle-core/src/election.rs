//! Initiator election.
//!
//! For every pair of participants the lexicographically smaller id sends the offer.
//! Both ends evaluate the same rule on the same pair, so no coordination is needed
//! and at most one side of a pair is ever the offerer.

use crate::model::ParticipantId;

/// The participant that originates the offer for the pair `(a, b)`.
pub fn initiator_for<'a>(a: &'a ParticipantId, b: &'a ParticipantId) -> &'a ParticipantId {
    if a <= b { a } else { b }
}

/// Whether `local` must send the offer toward `remote`.
pub fn should_initiate(local: &ParticipantId, remote: &ParticipantId) -> bool {
    local != remote && initiator_for(local, remote) == local
}

/// Members of a room snapshot that `local` must send offers to.
pub fn offer_targets<'a, I>(local: &ParticipantId, members: I) -> Vec<ParticipantId>
where
    I: IntoIterator<Item = &'a ParticipantId>,
{
    let mut targets: Vec<ParticipantId> = members
        .into_iter()
        .filter(|member| should_initiate(local, member))
        .cloned()
        .collect();
    targets.sort();
    targets.dedup();
    targets
}

/// Smallest id in a snapshot; it initiates toward every other member.
pub fn room_leader<'a, I>(members: I) -> Option<&'a ParticipantId>
where
    I: IntoIterator<Item = &'a ParticipantId>,
{
    members.into_iter().min()
}
