use crate::error::{SnapshotError, SnapshotResult};
use crate::streamer::Streamer;

/// Ordered set of streamers owned by a [`SnapshotManager`](crate::SnapshotManager).
///
/// Iteration follows registration order, which is also the slice order on the wire.
#[derive(Default)]
pub struct StreamerRegistry {
    streamers: Vec<Box<dyn Streamer>>,
}

impl StreamerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, streamer: Box<dyn Streamer>) -> SnapshotResult<()> {
        if self.find(streamer.pattern()).is_some() {
            return Err(SnapshotError::DuplicatePattern {
                pattern: streamer.pattern().to_owned(),
            });
        }
        self.streamers.push(streamer);
        Ok(())
    }

    /// Removes the streamer registered under `pattern`.
    pub fn unregister(&mut self, pattern: &str) -> Option<Box<dyn Streamer>> {
        let index = self
            .streamers
            .iter()
            .position(|streamer| streamer.pattern() == pattern)?;
        Some(self.streamers.remove(index))
    }

    #[must_use]
    pub fn find(&self, pattern: &str) -> Option<&dyn Streamer> {
        self.streamers
            .iter()
            .find(|streamer| streamer.pattern() == pattern)
            .map(|streamer| streamer.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Streamer> + '_ {
        self.streamers.iter().map(|streamer| streamer.as_ref())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Streamer>> + '_ {
        self.streamers.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streamers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streamers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamer::ComponentStreamer;
    use crate::transform::{Position, Rotation, Velocity};

    #[test]
    fn keeps_registration_order() {
        let mut registry = StreamerRegistry::new();
        registry
            .register(Box::new(ComponentStreamer::<Velocity>::new()))
            .unwrap();
        registry
            .register(Box::new(ComponentStreamer::<Position>::new()))
            .unwrap();
        let patterns: Vec<_> = registry.iter().map(Streamer::pattern).collect();
        assert_eq!(
            patterns,
            vec!["auto.transform.Velocity", "auto.transform.Position"]
        );
    }

    #[test]
    fn duplicate_rejected() {
        let mut registry = StreamerRegistry::new();
        registry
            .register(Box::new(ComponentStreamer::<Position>::new()))
            .unwrap();
        let err = registry
            .register(Box::new(ComponentStreamer::<Position>::new()))
            .unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicatePattern { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_removes() {
        let mut registry = StreamerRegistry::new();
        registry
            .register(Box::new(ComponentStreamer::<Position>::new()))
            .unwrap();
        registry
            .register(Box::new(ComponentStreamer::<Rotation>::new()))
            .unwrap();
        assert!(registry.unregister("auto.transform.Position").is_some());
        assert!(registry.unregister("auto.transform.Position").is_none());
        assert!(registry.find("auto.transform.Rotation").is_some());
        assert_eq!(registry.len(), 1);
    }
}
