//! Projection behavior options.

/// Options controlling projection behavior.
#[derive(Debug, Clone)]
pub struct ProjectionOptions {
    /// Restringify file values on every resolution so that external mutation
    /// of the backing graph surfaces as an mtime change on the next client
    /// access. Costs a stringify-and-compare per touch; hosts that never
    /// mutate values behind the projection's back can turn it off.
    pub track_external_changes: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            track_external_changes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tracks_external_changes() {
        assert!(ProjectionOptions::default().track_external_changes);
    }
}
