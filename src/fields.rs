//! Electric and magnetic field sources.
//!
//! The integrator samples a field four times per step at different
//! `(time, position)` pairs, so every implementation must be a pure function
//! of those two inputs.

use lorentz_common::{Vec2, Vec3};

/// A field evaluated at a point in space and time.
///
/// `V` is [`Vec2`] for in-plane electric fields (V/m) and [`Vec3`] for
/// magnetic fields (T).
pub trait Field<V>: Send + Sync {
    fn field_at(&self, time: f64, position: Vec2) -> V;
}

/// Spatially and temporally uniform field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformField<V>(pub V);

impl<V: Copy + Send + Sync> Field<V> for UniformField<V> {
    fn field_at(&self, _time: f64, _position: Vec2) -> V {
        self.0
    }
}

/// Field backed by a caller-supplied function of `(time, position)`.
#[derive(Clone, Copy)]
pub struct FunctionField<F>(pub F);

impl<V, F> Field<V> for FunctionField<F>
where
    F: Fn(f64, Vec2) -> V + Send + Sync,
{
    fn field_at(&self, time: f64, position: Vec2) -> V {
        (self.0)(time, position)
    }
}

/// The electric and magnetic field pair shared by every particle in a run.
pub struct Fields {
    electric: Box<dyn Field<Vec2>>,
    magnetic: Box<dyn Field<Vec3>>,
}

impl Fields {
    pub fn new<E, B>(electric: E, magnetic: B) -> Self
    where
        E: Field<Vec2> + 'static,
        B: Field<Vec3> + 'static,
    {
        Self {
            electric: Box::new(electric),
            magnetic: Box::new(magnetic),
        }
    }

    /// Constant `E` and `B` everywhere.
    pub fn uniform(electric: Vec2, magnetic: Vec3) -> Self {
        Self::new(UniformField(electric), UniformField(magnetic))
    }

    /// No fields at all; particles move inertially.
    pub fn none() -> Self {
        Self::uniform(Vec2::zero(), Vec3::zero())
    }

    pub fn electric_at(&self, time: f64, position: Vec2) -> Vec2 {
        self.electric.field_at(time, position)
    }

    pub fn magnetic_at(&self, time: f64, position: Vec2) -> Vec3 {
        self.magnetic.field_at(time, position)
    }
}

impl std::fmt::Debug for Fields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Report the field values at the origin at t = 0; the sources themselves are opaque.
        f.debug_struct("Fields")
            .field("electric@origin", &self.electric_at(0.0, Vec2::zero()))
            .field("magnetic@origin", &self.magnetic_at(0.0, Vec2::zero()))
            .finish()
    }
}
