//! Viewer position sources.

use tessera_shared::Vec2;

/// Pull source for the viewer's world position, sampled once per tick.
///
/// `x` is world X and `y` is world Z.
pub trait ViewerFeed {
    /// Current viewer position.
    fn viewer_position(&self) -> Vec2;
}

impl<F> ViewerFeed for F
where
    F: Fn() -> Vec2,
{
    fn viewer_position(&self) -> Vec2 {
        self()
    }
}

impl ViewerFeed for Vec2 {
    fn viewer_position(&self) -> Vec2 {
        *self
    }
}
