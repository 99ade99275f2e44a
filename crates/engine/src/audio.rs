use glam::{Quat, Vec3};

/// Collaborator contract for the audio backend: the update phase syncs the
/// listener to the primary controlled entity every frame. Mixing happens
/// elsewhere.
pub trait AudioSink {
    fn sync_listener(&mut self, position: Vec3, orientation: Quat);
}

/// Backend that discards listener updates.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn sync_listener(&mut self, _position: Vec3, _orientation: Quat) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_audio_accepts_updates() {
        let mut audio = NullAudio;
        audio.sync_listener(Vec3::ONE, Quat::IDENTITY);
    }
}
