// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The maps a population can be iterated under.
//!
//! Every transform is a plain `fn(f64) -> f64`.  None of them touch
//! shared state, so any number of workers may call the same transform
//! at once.  The two random transforms draw from the calling thread's
//! own generator.

use rand::{thread_rng, Rng};
use std::f64::consts::PI;

/// The signature every transform has.
pub type TransformFn = fn(f64) -> f64;

/// A named entry in the registry.
#[derive(Copy, Clone)]
pub struct Transform {
    /// The name used to select the transform at startup.
    pub name: &'static str,
    /// A human readable label for display.
    pub label: &'static str,
    function: TransformFn,
}

impl Transform {
    /// Wrap a function that is not in the registry.
    pub fn new(name: &'static str, label: &'static str, function: TransformFn) -> Self {
        Transform {
            name,
            label,
            function,
        }
    }

    /// Apply the map to one value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        (self.function)(value)
    }
}

impl ::std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish()
    }
}

/// The name selected when none is given, or when the given one is not
/// registered.
pub const DEFAULT_TRANSFORM: &str = "collatz";

static REGISTRY: [Transform; 10] = [
    Transform {
        name: "collatz",
        label: "Collatz's Problem",
        function: collatz,
    },
    Transform {
        name: "collatzFractal",
        label: "Collatz's Problem (Fractal)",
        function: collatz_fractal,
    },
    Transform {
        name: "iwanski",
        label: "Iwanski's Problem",
        function: iwanski,
    },
    Transform {
        name: "rand",
        label: "Random",
        function: random,
    },
    Transform {
        name: "cosine",
        label: "Cosine",
        function: cosine,
    },
    Transform {
        name: "sine",
        label: "Sine",
        function: sine,
    },
    Transform {
        name: "add",
        label: "Add",
        function: add,
    },
    Transform {
        name: "randWalk",
        label: "Random Walk",
        function: random_walk,
    },
    Transform {
        name: "custom",
        label: "Custom function",
        function: custom,
    },
    Transform {
        name: "identity",
        label: "Identity",
        function: identity,
    },
];

/// Every registered transform, in registration order.
pub fn all() -> &'static [Transform] {
    &REGISTRY
}

/// Find a transform by its exact name.
pub fn lookup(name: &str) -> Option<&'static Transform> {
    REGISTRY.iter().find(|t| t.name == name)
}

/// The transform used when nothing else is selected.
pub fn default_transform() -> &'static Transform {
    lookup(DEFAULT_TRANSFORM).unwrap_or(&REGISTRY[0])
}

/// The Collatz map with the odd step pre-divided by two, since 3x+1 is
/// always even for odd x.
pub fn collatz(x: f64) -> f64 {
    if x % 2.0 == 0.0 {
        x / 2.0
    } else {
        (x * 3.0 + 1.0) / 2.0
    }
}

/// A smooth interpolation between the two Collatz branches.  Undefined
/// (NaN) outside of `[-2/pi, 2/pi]`.
pub fn collatz_fractal(x: f64) -> f64 {
    let t = (PI / 2.0) * x;
    0.5 * x * t.acos() + ((3.0 * x + 1.0) / 2.0) * t.asin()
}

/// The sum of the squares of the decimal digits of the integral part of
/// `|x|`.  Happy numbers go to one; everything else falls into the
/// 4 -> 16 -> 37 -> ... cycle.
pub fn iwanski(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let mut n = x.abs().trunc();
    let mut sum = 0.0;
    while n > 0.0 {
        let digit = n % 10.0;
        sum += digit * digit;
        n = (n / 10.0).trunc();
    }
    sum
}

fn random(_: f64) -> f64 {
    thread_rng().gen::<f64>() * 10.0
}

fn cosine(x: f64) -> f64 {
    (x / 10.0).cos() * 10.0
}

fn sine(x: f64) -> f64 {
    (x / 10.0).sin() * 10.0
}

fn add(x: f64) -> f64 {
    x + 1.0
}

fn random_walk(x: f64) -> f64 {
    x + (thread_rng().gen::<f64>() - 0.5) * 10.0
}

fn custom(x: f64) -> f64 {
    (3.0 * x + 2.0) / (2.0 * x + 1.0)
}

fn identity(x: f64) -> f64 {
    x
}
