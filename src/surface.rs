//! Rendering surface abstraction.
//!
//! A [`PlotSurface`] is the external plotting component a sink draws into. It
//! hands out opaque [`CurveHandle`]s and accepts point data for them. The
//! sinks never talk to egui directly; the viewer provides an
//! [`EguiPlotSurface`](crate::plot::EguiPlotSurface) and tests use
//! [`MemorySurface`].
//!
//! Surfaces are shared between the sink that mutates them and the view that
//! draws them, so the trait is also implemented for `Rc<RefCell<S>>` and
//! `Weak<RefCell<S>>`. A `Weak` whose surface has been dropped reports
//! [`SurfaceError::Destroyed`], which is how a closed window shows up at the
//! sink boundary.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::channel::ChannelKey;
use crate::error::SurfaceError;

/// Opaque identifier of a curve, issued by the surface that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurveHandle(pub u64);

pub trait PlotSurface {
    /// Create an empty curve labelled with `key`.
    fn create_curve(&mut self, key: &ChannelKey) -> Result<CurveHandle, SurfaceError>;

    /// Replace the displayed data of a curve.
    fn update_curve(&mut self, handle: CurveHandle, points: Vec<[f64; 2]>) -> Result<(), SurfaceError>;

    fn remove_curve(&mut self, handle: CurveHandle) -> Result<(), SurfaceError>;
}

impl<S: PlotSurface> PlotSurface for Rc<RefCell<S>> {
    fn create_curve(&mut self, key: &ChannelKey) -> Result<CurveHandle, SurfaceError> {
        self.borrow_mut().create_curve(key)
    }

    fn update_curve(&mut self, handle: CurveHandle, points: Vec<[f64; 2]>) -> Result<(), SurfaceError> {
        self.borrow_mut().update_curve(handle, points)
    }

    fn remove_curve(&mut self, handle: CurveHandle) -> Result<(), SurfaceError> {
        self.borrow_mut().remove_curve(handle)
    }
}

impl<S: PlotSurface> PlotSurface for Weak<RefCell<S>> {
    fn create_curve(&mut self, key: &ChannelKey) -> Result<CurveHandle, SurfaceError> {
        let surface = self.upgrade().ok_or(SurfaceError::Destroyed)?;
        let mut surface = surface.borrow_mut();
        surface.create_curve(key)
    }

    fn update_curve(&mut self, handle: CurveHandle, points: Vec<[f64; 2]>) -> Result<(), SurfaceError> {
        let surface = self.upgrade().ok_or(SurfaceError::Destroyed)?;
        let mut surface = surface.borrow_mut();
        surface.update_curve(handle, points)
    }

    fn remove_curve(&mut self, handle: CurveHandle) -> Result<(), SurfaceError> {
        let surface = self.upgrade().ok_or(SurfaceError::Destroyed)?;
        let mut surface = surface.borrow_mut();
        surface.remove_curve(handle)
    }
}

/// A curve held by a [`MemorySurface`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryCurve {
    pub key: ChannelKey,
    pub points: Vec<[f64; 2]>,
    pub updates: usize,
}

/// Headless surface that keeps curves in memory.
///
/// Used when no window is attached and in tests. [`destroy`](Self::destroy)
/// simulates the window going away: every later call fails with
/// [`SurfaceError::Destroyed`].
#[derive(Debug, Default)]
pub struct MemorySurface {
    curves: BTreeMap<CurveHandle, MemoryCurve>,
    next_handle: u64,
    destroyed: bool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.curves.clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn curve(&self, handle: CurveHandle) -> Option<&MemoryCurve> {
        self.curves.get(&handle)
    }

    /// Find the curve labelled with `key`.
    pub fn curve_for(&self, key: &ChannelKey) -> Option<&MemoryCurve> {
        self.curves.values().find(|c| &c.key == key)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    fn check_alive(&self) -> Result<(), SurfaceError> {
        if self.destroyed {
            Err(SurfaceError::Destroyed)
        } else {
            Ok(())
        }
    }
}

impl PlotSurface for MemorySurface {
    fn create_curve(&mut self, key: &ChannelKey) -> Result<CurveHandle, SurfaceError> {
        self.check_alive()?;
        self.next_handle += 1;
        let handle = CurveHandle(self.next_handle);
        self.curves.insert(
            handle,
            MemoryCurve {
                key: key.clone(),
                ..Default::default()
            },
        );
        Ok(handle)
    }

    fn update_curve(&mut self, handle: CurveHandle, points: Vec<[f64; 2]>) -> Result<(), SurfaceError> {
        self.check_alive()?;
        let curve = self
            .curves
            .get_mut(&handle)
            .ok_or_else(|| SurfaceError::Rejected(format!("unknown curve {}", handle.0)))?;
        curve.points = points;
        curve.updates += 1;
        Ok(())
    }

    fn remove_curve(&mut self, handle: CurveHandle) -> Result<(), SurfaceError> {
        self.check_alive()?;
        self.curves.remove(&handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_surface_issues_distinct_handles() {
        let mut s = MemorySurface::new();
        let a = s.create_curve(&"red".into()).unwrap();
        let b = s.create_curve(&"blue".into()).unwrap();
        assert_ne!(a, b);
        s.update_curve(a, vec![[0.0, 1.0]]).unwrap();
        assert_eq!(s.curve(a).unwrap().points, vec![[0.0, 1.0]]);
        s.remove_curve(a).unwrap();
        assert!(s.curve(a).is_none());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn destroyed_memory_surface_reports_destroyed() {
        let mut s = MemorySurface::new();
        let a = s.create_curve(&"red".into()).unwrap();
        s.destroy();
        assert_eq!(s.update_curve(a, vec![]), Err(SurfaceError::Destroyed));
        assert_eq!(s.create_curve(&"red".into()), Err(SurfaceError::Destroyed));
    }

    #[test]
    fn weak_surface_is_destroyed_once_owner_drops() {
        let owner = Rc::new(RefCell::new(MemorySurface::new()));
        let mut weak = Rc::downgrade(&owner);
        let h = weak.create_curve(&"red".into()).unwrap();
        weak.update_curve(h, vec![[1.0, 2.0]]).unwrap();
        assert_eq!(owner.borrow().curve(h).unwrap().updates, 1);
        drop(owner);
        assert_eq!(weak.update_curve(h, vec![]), Err(SurfaceError::Destroyed));
    }

    #[test]
    fn unknown_handle_is_rejected_not_destroyed() {
        let mut s = MemorySurface::new();
        let err = s.update_curve(CurveHandle(42), vec![]).unwrap_err();
        assert!(matches!(err, SurfaceError::Rejected(_)));
    }
}
