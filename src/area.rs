//! Listener interaction with volumetric areas.
//!
//! An external containment system reports when a listener enters, approaches,
//! moves inside or leaves an area. [`AreaTransitionPolicy`] turns each report
//! into the position the receiving owner should snap to, which keeps
//! ambience emitters glued to the closest point the listener can hear them
//! from. The world then applies that position like any other transform change.

use crate::math::Vec3;

/// Volume queries the containment system answers for one area.
pub trait AreaVolume {
    fn contains(&self, point: Vec3) -> bool;

    /// Closest point on the area's boundary to `point`, whether `point` is inside or not.
    fn closest_point_on_hull(&self, point: Vec3) -> Vec3;
}

/// Axis-aligned box area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxArea {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoxArea {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }
}

impl AreaVolume for BoxArea {
    fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    fn closest_point_on_hull(&self, point: Vec3) -> Vec3 {
        if !self.contains(point) {
            return point.clamp(self.min, self.max);
        }

        // Inside: push out through the nearest face.
        let to_min = point - self.min;
        let to_max = self.max - point;
        let mut result = point;
        let mut best = f32::INFINITY;
        for axis in 0..3 {
            if to_min[axis] < best {
                best = to_min[axis];
                result = point;
                result[axis] = self.min[axis];
            }
            if to_max[axis] < best {
                best = to_max[axis];
                result = point;
                result[axis] = self.max[axis];
            }
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereArea {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereArea {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.abs(),
        }
    }
}

impl AreaVolume for SphereArea {
    fn contains(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    fn closest_point_on_hull(&self, point: Vec3) -> Vec3 {
        let direction = (point - self.center).try_normalize().unwrap_or(Vec3::X);
        self.center + direction * self.radius
    }
}

/// The entity whose movement an area reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaSubject {
    pub position: Vec3,
    pub is_listener: bool,
}

impl AreaSubject {
    pub fn listener(position: Vec3) -> Self {
        Self {
            position,
            is_listener: true,
        }
    }
}

/// Area-crossing report from the containment system.
#[derive(Clone, Copy)]
pub enum AreaEvent<'a> {
    /// Subject was newly detected inside an area
    Enter { subject: AreaSubject },
    /// Subject is near but not inside an area
    MoveNear {
        subject: AreaSubject,
        closest_point: Vec3,
    },
    /// Subject moved inside `low`; `high` is a higher-priority area overlapping it
    MoveInside {
        subject: AreaSubject,
        point: Vec3,
        low: &'a dyn AreaVolume,
        high: Option<&'a dyn AreaVolume>,
        /// Blend factor reported by the containment system
        fade: f32,
    },
    Leave { subject: AreaSubject },
}

impl AreaEvent<'_> {
    pub fn subject(&self) -> AreaSubject {
        match self {
            Self::Enter { subject }
            | Self::MoveNear { subject, .. }
            | Self::MoveInside { subject, .. }
            | Self::Leave { subject } => *subject,
        }
    }
}

/// Which containment rule currently applies to an owner. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaMembership {
    #[default]
    None,
    InsideSingle,
    InsideBlended,
    Near,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaTransition {
    pub membership: AreaMembership,
    /// Position the owner snaps to, `None` to stay put this tick
    pub position: Option<Vec3>,
    /// Blend factor between two overlapping areas, in `[0, 1]`
    pub blend: Option<f32>,
}

pub struct AreaTransitionPolicy;

impl AreaTransitionPolicy {
    /// Resolves an area report. `None` when the subject is not a listener.
    pub fn resolve(event: &AreaEvent<'_>) -> Option<AreaTransition> {
        if !event.subject().is_listener {
            return None;
        }

        let transition = match *event {
            AreaEvent::Enter { subject } => AreaTransition {
                membership: AreaMembership::InsideSingle,
                position: Some(subject.position),
                blend: None,
            },
            AreaEvent::MoveNear { closest_point, .. } => AreaTransition {
                membership: AreaMembership::Near,
                position: Some(closest_point),
                blend: None,
            },
            AreaEvent::MoveInside {
                point, high: None, ..
            } => AreaTransition {
                membership: AreaMembership::InsideSingle,
                position: Some(point),
                blend: None,
            },
            AreaEvent::MoveInside {
                subject,
                low,
                high: Some(high),
                fade,
                ..
            } => {
                let position = low
                    .contains(subject.position)
                    .then(|| high.closest_point_on_hull(subject.position));
                AreaTransition {
                    membership: AreaMembership::InsideBlended,
                    position,
                    blend: Some(if fade.is_nan() { 0.0 } else { fade.clamp(0.0, 1.0) }),
                }
            }
            AreaEvent::Leave { .. } => AreaTransition {
                membership: AreaMembership::None,
                position: None,
                blend: None,
            },
        };
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoxArea {
        BoxArea::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    fn on_box_surface(area: &BoxArea, point: Vec3) -> bool {
        let eps = 1e-5;
        area.contains(point)
            && (0..3).any(|axis| {
                (point[axis] - area.min[axis]).abs() < eps
                    || (point[axis] - area.max[axis]).abs() < eps
            })
    }

    #[test]
    fn test_box_hull_from_inside_and_outside() {
        let area = unit_box();
        assert_eq!(
            area.closest_point_on_hull(Vec3::new(0.8, 0.0, 0.1)),
            Vec3::new(1.0, 0.0, 0.1)
        );
        assert_eq!(
            area.closest_point_on_hull(Vec3::new(3.0, 0.5, 0.0)),
            Vec3::new(1.0, 0.5, 0.0)
        );
    }

    #[test]
    fn test_sphere_hull() {
        let area = SphereArea::new(Vec3::ZERO, 2.0);
        assert!(area.contains(Vec3::new(1.0, 1.0, 0.0)));
        let hull = area.closest_point_on_hull(Vec3::new(0.0, 0.5, 0.0));
        assert!((hull - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_non_listener_subjects_are_ignored() {
        let event = AreaEvent::Enter {
            subject: AreaSubject {
                position: Vec3::ONE,
                is_listener: false,
            },
        };
        assert!(AreaTransitionPolicy::resolve(&event).is_none());
    }

    #[test]
    fn test_enter_and_near_snap_to_reported_points() {
        let enter = AreaEvent::Enter {
            subject: AreaSubject::listener(Vec3::new(4.0, 0.0, 0.0)),
        };
        let transition = AreaTransitionPolicy::resolve(&enter).unwrap();
        assert_eq!(transition.position, Some(Vec3::new(4.0, 0.0, 0.0)));
        assert_eq!(transition.membership, AreaMembership::InsideSingle);

        let near = AreaEvent::MoveNear {
            subject: AreaSubject::listener(Vec3::new(9.0, 0.0, 0.0)),
            closest_point: Vec3::new(5.0, 0.0, 0.0),
        };
        let transition = AreaTransitionPolicy::resolve(&near).unwrap();
        assert_eq!(transition.position, Some(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(transition.membership, AreaMembership::Near);
    }

    #[test]
    fn test_single_area_inside_uses_supplied_point() {
        let low = unit_box();
        let event = AreaEvent::MoveInside {
            subject: AreaSubject::listener(Vec3::ZERO),
            point: Vec3::new(0.2, 0.3, 0.4),
            low: &low,
            high: None,
            fade: 1.0,
        };
        let transition = AreaTransitionPolicy::resolve(&event).unwrap();
        assert_eq!(transition.position, Some(Vec3::new(0.2, 0.3, 0.4)));
        assert_eq!(transition.blend, None);
    }

    #[test]
    fn test_dual_area_blend_lands_on_high_hull() {
        let low = BoxArea::new(Vec3::splat(-10.0), Vec3::splat(10.0));
        let high = unit_box();
        let listener = Vec3::new(4.0, 0.25, -0.5);
        let event = AreaEvent::MoveInside {
            subject: AreaSubject::listener(listener),
            point: Vec3::ZERO,
            low: &low,
            high: Some(&high),
            fade: 0.5,
        };

        let transition = AreaTransitionPolicy::resolve(&event).unwrap();
        assert_eq!(transition.membership, AreaMembership::InsideBlended);
        let position = transition.position.unwrap();
        assert!(on_box_surface(&high, position));
        assert_eq!(position, Vec3::new(1.0, 0.25, -0.5));
        assert_eq!(transition.blend, Some(0.5));
    }

    #[test]
    fn test_dual_area_outside_low_does_not_move() {
        let low = unit_box();
        let high = SphereArea::new(Vec3::ZERO, 0.5);
        let event = AreaEvent::MoveInside {
            subject: AreaSubject::listener(Vec3::new(5.0, 0.0, 0.0)),
            point: Vec3::ZERO,
            low: &low,
            high: Some(&high),
            fade: 3.0,
        };
        let transition = AreaTransitionPolicy::resolve(&event).unwrap();
        assert_eq!(transition.position, None);
        assert_eq!(transition.blend, Some(1.0));
    }
}
