//! Pure, stateless rectangle geometry: intersection with clearance, rotation,
//! and containment checks.
//!
//! Every function here is a pure function of its arguments; nothing in this
//! crate holds state. All arithmetic is `f64` millimetres, matching spec
//! §4.1's "All arithmetic is on 64-bit floats at the design level."

use autoclave_types::Autoclave;

/// An axis-aligned rectangle anchored at its lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.y + self.h
    }
}

/// Inflate a box by `gap` on all four sides.
#[must_use]
pub fn expand(b: BBox, gap: f64) -> BBox {
    BBox {
        x: b.x - gap,
        y: b.y - gap,
        w: b.w + 2.0 * gap,
        h: b.h + 2.0 * gap,
    }
}

/// True iff `a` and `b` inflated by `gamma` share interior points. Touching
/// edges (including the case of exactly `gamma` clearance between the
/// original boxes) count as non-overlapping, since strict inequalities are
/// used throughout.
#[must_use]
pub fn overlap_with_gap(a: BBox, b: BBox, gamma: f64) -> bool {
    let inflated = expand(b, gamma);
    a.x < inflated.right() && a.right() > inflated.x && a.y < inflated.top() && a.top() > inflated.y
}

/// Containment with border margin `beta`: the box lies fully inside the
/// autoclave's interior, at least `beta` away from every wall.
#[must_use]
pub fn fits_in_autoclave(b: BBox, autoclave: &Autoclave, beta: f64) -> bool {
    b.x >= beta
        && b.y >= beta
        && b.right() <= autoclave.width - beta
        && b.top() <= autoclave.length - beta
}

/// `(W, H)` if `rotated` is false, `(H, W)` otherwise (a 90-degree turn).
#[must_use]
pub fn rotated_dims(width: f64, height: f64, rotated: bool) -> (f64, f64) {
    if rotated {
        (height, width)
    } else {
        (width, height)
    }
}
