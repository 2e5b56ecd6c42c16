use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rhai::{AST, Dynamic, Engine, ImmutableString, Scope};

use crate::foundation::core::SceneId;
use crate::foundation::math::seeded_random;
use crate::script::canvas2d::{self, BufferSnapshot, Canvas2d};

/// Limits applied to every scene program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SandboxOpts {
    /// Operation budget per invocation; 0 means unlimited.
    pub max_operations: u64,
    /// Maximum function call depth.
    pub max_call_levels: usize,
}

impl Default for SandboxOpts {
    fn default() -> Self {
        Self {
            max_operations: 0,
            max_call_levels: 64,
        }
    }
}

impl SandboxOpts {
    /// Set the operation budget.
    pub fn with_max_operations(mut self, ops: u64) -> Self {
        self.max_operations = ops;
        self
    }

    /// Set the call depth limit.
    pub fn with_max_call_levels(mut self, levels: usize) -> Self {
        self.max_call_levels = levels;
        self
    }

    /// Apply `DEMOLINE_SCRIPT_MAX_OPS` when it parses.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ops) = std::env::var("DEMOLINE_SCRIPT_MAX_OPS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.max_operations = ops;
        }
        self
    }
}

/// A successfully compiled scene program.
#[derive(Clone, Debug)]
pub struct CompiledScene {
    ast: Rc<AST>,
    fingerprint: u64,
}

impl CompiledScene {
    /// xxh3 hash of the source text.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Arguments bound in the scene's scope for one invocation.
pub struct SceneCall {
    /// Drawing context bound as `ctx`.
    pub canvas: Canvas2d,
    /// Milliseconds since the scene's start.
    pub local_time: f64,
    /// Surface width, bound as `w`.
    pub width: i64,
    /// Surface height, bound as `h`.
    pub height: i64,
    /// Scene start in ms, bound as `sceneStart`.
    pub scene_start: i64,
    /// Scene end in ms, bound as `sceneEnd`.
    pub scene_end: i64,
    /// Buffers `getBuffer` may return during this call.
    pub buffers: BufferSnapshot,
}

struct CacheEntry {
    fingerprint: u64,
    compiled: Result<CompiledScene, String>,
}

/// Embedded script engine with the scene capability surface registered.
///
/// Exposes the canvas API, `seededRandom` and `getBuffer`, the standard rhai packages and
/// nothing else: module imports resolve to nothing and `eval` is disabled.
pub struct Sandbox {
    engine: Engine,
    buffers: Rc<RefCell<BufferSnapshot>>,
    cache: HashMap<SceneId, CacheEntry>,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(SandboxOpts::default())
    }
}

impl Sandbox {
    /// Engine with the scene capabilities registered.
    pub fn new(opts: SandboxOpts) -> Self {
        let mut engine = Engine::new();
        engine.set_module_resolver(rhai::module_resolvers::DummyModuleResolver::new());
        engine.disable_symbol("eval");
        engine.set_max_operations(opts.max_operations);
        engine.set_max_call_levels(opts.max_call_levels);
        engine.on_print(|s| tracing::info!(target: "demoline::scene", "{s}"));
        engine.on_debug(|s, _src, pos| tracing::debug!(target: "demoline::scene", %pos, "{s}"));

        canvas2d::register(&mut engine);
        engine
            .register_fn("seededRandom", seeded_random)
            .register_fn("seededRandom", |seed: i64| seeded_random(seed as f64));

        let buffers: Rc<RefCell<BufferSnapshot>> = Rc::default();
        let slot = Rc::clone(&buffers);
        engine.register_fn("getBuffer", move |name: ImmutableString| -> Dynamic {
            slot.borrow()
                .get(name.as_str())
                .cloned()
                .map_or(Dynamic::UNIT, Dynamic::from)
        });

        Self {
            engine,
            buffers,
            cache: HashMap::new(),
        }
    }

    /// Compile stage. The error string is the parser's message.
    pub fn compile(&self, code: &str) -> Result<CompiledScene, String> {
        let fingerprint = xxhash_rust::xxh3::xxh3_64(code.as_bytes());
        self.engine
            .compile(code)
            .map(|ast| CompiledScene {
                ast: Rc::new(ast),
                fingerprint,
            })
            .map_err(|e| e.to_string())
    }

    /// Compile through the per-scene cache; unchanged code is never recompiled.
    pub fn compile_cached(&mut self, scene: SceneId, code: &str) -> Result<CompiledScene, String> {
        let fingerprint = xxhash_rust::xxh3::xxh3_64(code.as_bytes());
        if let Some(entry) = self.cache.get(&scene)
            && entry.fingerprint == fingerprint
        {
            return entry.compiled.clone();
        }
        let compiled = self.compile(code);
        if let Err(msg) = &compiled {
            tracing::debug!(%scene, error = %msg, "scene failed to compile");
        }
        self.cache.insert(
            scene,
            CacheEntry {
                fingerprint,
                compiled: compiled.clone(),
            },
        );
        compiled
    }

    /// Drop cached programs for scenes that no longer exist.
    pub fn retain_scenes(&mut self, keep: impl Fn(SceneId) -> bool) {
        self.cache.retain(|id, _| keep(*id));
    }

    /// Execute stage. Runs the program once with the fixed parameter names bound.
    pub fn invoke(&self, compiled: &CompiledScene, call: SceneCall) -> Result<(), String> {
        *self.buffers.borrow_mut() = call.buffers;
        let mut scope = Scope::new();
        scope
            .push("ctx", call.canvas)
            .push("t", call.local_time)
            .push("w", call.width)
            .push("h", call.height)
            .push("sceneStart", call.scene_start)
            .push("sceneEnd", call.scene_end);
        let out = self
            .engine
            .run_ast_with_scope(&mut scope, &compiled.ast)
            .map_err(|e| e.to_string());
        *self.buffers.borrow_mut() = BufferSnapshot::default();
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/sandbox.rs"]
mod tests;
