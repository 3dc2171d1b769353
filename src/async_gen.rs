//! Background material generation.
//!
//! A synthesis pass is one blocking O(size²) loop with no yield points, so it
//! runs on a private, bounded [`rayon`] pool instead of Bevy's task pools.
//! When a task finishes, [`poll_material_tasks`] uploads the maps to
//! [`Assets<Image>`] and tags the entity with [`MaterialReady`].
//!
//! # Usage
//! ```rust,ignore
//! commands.spawn(PendingMaterial::new(GenerationParameters::default(), PREVIEW_SIZE));
//!
//! // Later, query for MaterialReady to consume the handles.
//! ```

use std::sync::{
    Arc, Mutex, OnceLock,
    atomic::{AtomicBool, Ordering},
    mpsc,
};

use bevy::{
    asset::Assets,
    ecs::{
        component::Component,
        entity::Entity,
        system::{Commands, Query, ResMut},
    },
    image::Image,
};

use crate::{
    generator::{
        MaterialGenerator, PbrHandles, TextureError, TextureGenerator, TextureMap, map_to_images,
    },
    params::GenerationParameters,
};

/// Maximum number of generation tasks that run concurrently.
const MAX_GENERATION_THREADS: usize = 4;

/// The library-private pool, isolated from the application's global rayon
/// pool so the concurrency cap holds regardless of how the app configures it.
fn gen_pool() -> &'static rayon::ThreadPool {
    static POOL: OnceLock<rayon::ThreadPool> = OnceLock::new();
    POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(MAX_GENERATION_THREADS)
            .thread_name(|i| format!("pbr-gen-{i}"))
            .build()
            .expect("failed to build material generation thread pool")
    })
}

/// Spawned onto an entity to request background generation of all four maps.
///
/// Synthesis itself cannot be interrupted.  Dropping the component (e.g. by
/// despawning the entity) sets a flag that makes a task which has not started
/// yet skip its work; a task already running completes and its result is
/// discarded.
#[derive(Component)]
pub struct PendingMaterial {
    // Mutex makes the receiver Sync, which Bevy's Component bound requires.
    rx: Mutex<mpsc::Receiver<Result<TextureMap, TextureError>>>,
    cancelled: Arc<AtomicBool>,
}

impl Drop for PendingMaterial {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl PendingMaterial {
    /// Queue generation of `params` at `size × size` texels.
    pub fn new(params: GenerationParameters, size: u32) -> Self {
        let generator = MaterialGenerator::new(params);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let (tx, rx) = mpsc::sync_channel(1);
        gen_pool().spawn(move || {
            if !flag.load(Ordering::Relaxed) {
                tx.send(generator.generate(size)).ok();
            }
        });
        Self {
            rx: Mutex::new(rx),
            cancelled,
        }
    }

    /// Non-blocking check for a finished result.
    fn try_take(&self) -> Result<Result<TextureMap, TextureError>, mpsc::TryRecvError> {
        match self.rx.lock() {
            Ok(rx) => rx.try_recv(),
            Err(poisoned) => poisoned.into_inner().try_recv(),
        }
    }

    /// Block until the task finishes.  Intended for tests and tools.
    pub fn wait(self) -> Option<Result<TextureMap, TextureError>> {
        match self.rx.lock() {
            Ok(rx) => rx.recv().ok(),
            Err(poisoned) => poisoned.into_inner().recv().ok(),
        }
    }
}

/// Added to the entity by [`poll_material_tasks`] when generation is complete.
#[derive(Component)]
pub struct MaterialReady(pub PbrHandles);

/// Bevy system: polls pending tasks and uploads finished maps.
pub fn poll_material_tasks(
    mut commands: Commands,
    tasks: Query<(Entity, &PendingMaterial)>,
    mut images: ResMut<Assets<Image>>,
) {
    for (entity, pending) in &tasks {
        match pending.try_take() {
            Ok(Ok(map)) => {
                bevy::log::debug!("material maps ready ({0}×{0})", map.size());
                match map_to_images(map, &mut images) {
                    Ok(handles) => {
                        commands
                            .entity(entity)
                            .remove::<PendingMaterial>()
                            .insert(MaterialReady(handles));
                    }
                    Err(e) => {
                        bevy::log::error!("Material upload failed: {e}");
                        commands.entity(entity).remove::<PendingMaterial>();
                    }
                }
            }
            Ok(Err(e)) => {
                bevy::log::error!("Material generation failed: {e}");
                commands.entity(entity).remove::<PendingMaterial>();
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                bevy::log::error!("Material generation thread panicked");
                commands.entity(entity).remove::<PendingMaterial>();
            }
            Err(mpsc::TryRecvError::Empty) => {}
        }
    }
}
