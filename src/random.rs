use crate::{
    context::{Context, DataPlugin},
    hashing::hash_str,
    type_of,
    TypeId,
};
use log::trace;
use rand::{
    distr::uniform::{SampleRange, SampleUniform},
    prelude::Distribution,
    Rng,
    RngCore,
    SeedableRng,
};
use rustc_hash::FxHashMap;
use std::any::Any;

/// Names a random stream. Every stream used by a run is seeded from the base
/// seed plus a hash of its name, so adding draws to one stream never shifts
/// the values seen by another.
pub trait RngId: Any {
    type RngType: SeedableRng + RngCore + 'static;
    fn name() -> &'static str;
}

struct RngPlugin {
    base_seed: u64,
    // This is actually a `HashMap<TypeId, R::RngType>`
    rng_map: FxHashMap<TypeId, Box<dyn Any>>,
}

impl RngPlugin {
    fn clear(&mut self) {
        self.rng_map.clear();
    }

    fn get_rng<R: RngId>(&mut self) -> &mut R::RngType {
        let base_seed = self.base_seed;
        self.rng_map
            .entry(type_of::<R>())
            .or_insert_with(|| {
                let seed_offset = base_seed.wrapping_add(hash_str(R::name()));
                trace!("creating random stream {} with seed {}", R::name(), seed_offset);
                Box::new(R::RngType::seed_from_u64(seed_offset))
            })
            .downcast_mut::<R::RngType>()
            .unwrap() // Will never panic as the stream is stored under its own `RngId`
    }
}

impl DataPlugin for RngPlugin {
    fn init() -> Self {
        RngPlugin {
            base_seed: 0,
            rng_map: FxHashMap::default(),
        }
    }
}

/// Gets a mutable reference to the random number generator associated with the given
/// `RngId`.
// This is a private free function so that it's not leaked to the public API.
fn get_rng<R: RngId>(context: &mut Context) -> &mut R::RngType {
    context.get_data_container_mut::<RngPlugin>().get_rng::<R>()
}

pub trait ContextRandomExt {
    /// Sets the base seed and drops any streams created so far, so they get
    /// re-seeded on next use.
    fn init_random(&mut self, base_seed: u64);

    /// Gets a random sample from the random number generator associated with the given
    /// `RngId` by applying the specified sampler function. If the Rng has not been used
    /// before, one will be created with the base seed you defined in `init_random`.
    fn sample<R: RngId, T>(&mut self, sampler: impl FnOnce(&mut R::RngType) -> T) -> T;

    /// Gets a random sample from the specified distribution using the generator
    /// associated with the given `RngId`.
    fn sample_distr<R: RngId, T>(&mut self, distribution: impl Distribution<T>) -> T;

    /// Gets a random sample within the range provided by `range`
    /// using the generator associated with the given `RngId`.
    fn sample_range<R: RngId, S, T>(&mut self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform;

    /// Gets a random boolean value which is true with probability `p`
    /// using the generator associated with the given `RngId`.
    fn sample_bool<R: RngId>(&mut self, p: f64) -> bool;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with base seed {}", base_seed);
        let rng_container = self.get_data_container_mut::<RngPlugin>();
        rng_container.base_seed = base_seed;
        rng_container.clear();
    }

    fn sample<R: RngId, T>(&mut self, sampler: impl FnOnce(&mut R::RngType) -> T) -> T {
        let rng = get_rng::<R>(self);
        sampler(rng)
    }

    fn sample_distr<R: RngId, T>(&mut self, distribution: impl Distribution<T>) -> T {
        let rng = get_rng::<R>(self);
        distribution.sample(rng)
    }

    fn sample_range<R: RngId, S, T>(&mut self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample::<R, T>(|rng| rng.random_range(range))
    }

    fn sample_bool<R: RngId>(&mut self, p: f64) -> bool {
        self.sample::<R, bool>(|rng| rng.random_bool(p))
    }
}

/// Declares a named random stream backed by `StdRng`, or by the given
/// generator type.
#[macro_export]
macro_rules! define_rng {
    ($random_id:ident) => {
        $crate::define_rng!($random_id, $crate::rand::rngs::StdRng);
    };
    ($random_id:ident, $rng_type:ty) => {
        struct $random_id;

        impl $crate::random::RngId for $random_id {
            type RngType = $rng_type;

            fn name() -> &'static str {
                stringify!($random_id)
            }
        }
    };
}
#[allow(unused_imports)]
pub use define_rng;
