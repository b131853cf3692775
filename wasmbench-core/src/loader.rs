//! Module Loader
//!
//! Turns a [`BinarySource`] into an [`ExecutableHandle`] in two explicit
//! phases:
//!
//! ```text
//! BinarySource ──read──► bytes ──compile──► ExecutableModule ──instantiate──► ExecutableHandle
//!                (tokio::fs)      (blocking pool)              (fresh Store)
//! ```
//!
//! Compilation is the expensive, cacheable step and runs on tokio's blocking
//! pool so independent loads can proceed side by side. Instantiation is cheap
//! and stateful: every call produces a new store, so one compiled module can
//! back any number of independent handles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;
use wasmtime::{Config, Engine, ExternType, Func, Linker, Module, Store};

use crate::error::{HarnessError, Result};
use crate::value::Signature;

/// Where a module's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySource {
    path: PathBuf,
}

impl BinarySource {
    /// Source at an already-resolved path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve `locator` against `base`. Absolute locators are kept as-is.
    pub fn resolve(base: impl AsRef<Path>, locator: impl AsRef<Path>) -> Self {
        Self::new(base.as_ref().join(locator))
    }

    /// Filesystem path of the module
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem, used as a default label
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Code generation level for the runtime compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    /// No optimizations
    None,
    /// Optimize for speed
    #[default]
    Speed,
    /// Optimize for speed and size
    SpeedAndSize,
}

/// Runtime engine settings
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Code generation level applied to every module
    pub opt_level: OptLevel,
    /// Compile functions of a module in parallel
    pub parallel_compilation: bool,
    /// Satisfy unknown function imports with trapping stubs
    pub stub_imports: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::Speed,
            parallel_compilation: true,
            stub_imports: true,
        }
    }
}

/// Compiles and instantiates modules against a shared engine
#[derive(Clone)]
pub struct ModuleLoader {
    engine: Engine,
    stub_imports: bool,
}

impl ModuleLoader {
    /// Create a loader with its own engine
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        let mut config = Config::new();
        config.cranelift_opt_level(match settings.opt_level {
            OptLevel::None => wasmtime::OptLevel::None,
            OptLevel::Speed => wasmtime::OptLevel::Speed,
            OptLevel::SpeedAndSize => wasmtime::OptLevel::SpeedAndSize,
        });
        config.parallel_compilation(settings.parallel_compilation);

        let engine = Engine::new(&config).map_err(|e| HarnessError::Engine(format!("{e:#}")))?;
        Ok(Self {
            engine,
            stub_imports: settings.stub_imports,
        })
    }

    /// Read the raw bytes behind `source`
    pub async fn read(&self, source: &BinarySource) -> Result<Vec<u8>> {
        tokio::fs::read(source.path())
            .await
            .map_err(|e| HarnessError::Load {
                path: source.path().to_path_buf(),
                source: e,
            })
    }

    /// Read and compile `source`
    pub async fn compile(&self, source: &BinarySource) -> Result<ExecutableModule> {
        let bytes = self.read(source).await?;
        self.compile_bytes(source.path(), bytes).await
    }

    /// Compile bytes (binary or text format) that were acquired elsewhere.
    ///
    /// `origin` only labels diagnostics.
    pub async fn compile_bytes(
        &self,
        origin: impl AsRef<Path>,
        bytes: Vec<u8>,
    ) -> Result<ExecutableModule> {
        let path = origin.as_ref().to_path_buf();
        let engine = self.engine.clone();
        let len = bytes.len();

        let start = Instant::now();
        let compiled = tokio::task::spawn_blocking(move || Module::new(&engine, &bytes)).await?;
        let module = compiled.map_err(|e| HarnessError::Compile {
            path: path.clone(),
            message: format!("{e:#}"),
        })?;

        debug!(
            path = %path.display(),
            bytes = len,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "compiled module"
        );

        Ok(ExecutableModule {
            path,
            module,
            stub_imports: self.stub_imports,
        })
    }

    /// Read, compile and instantiate `source`
    pub async fn load(&self, source: &BinarySource) -> Result<ExecutableHandle> {
        self.compile(source).await?.instantiate()
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            stub_imports: true,
        }
    }
}

/// A validated, compiled module ready to be instantiated
#[derive(Clone)]
pub struct ExecutableModule {
    path: PathBuf,
    module: Module,
    stub_imports: bool,
}

impl ExecutableModule {
    /// Source the module was compiled from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Function exports and their signatures, in declaration order.
    ///
    /// Exports using non-numeric types carry the corresponding error.
    pub fn function_exports(&self) -> Vec<(String, Result<Signature>)> {
        self.module
            .exports()
            .filter_map(|export| match export.ty() {
                ExternType::Func(ty) => Some((
                    export.name().to_string(),
                    Signature::from_func_type(export.name(), &ty),
                )),
                _ => None,
            })
            .collect()
    }

    /// Bind the module to a fresh store and instance
    pub fn instantiate(&self) -> Result<ExecutableHandle> {
        let instantiate_err = |e: wasmtime::Error| HarnessError::Instantiate {
            path: self.path.clone(),
            message: format!("{e:#}"),
        };

        let engine = self.module.engine();
        let mut store = Store::new(engine, ());
        let mut linker = Linker::new(engine);
        if self.stub_imports {
            linker
                .define_unknown_imports_as_traps(&self.module)
                .map_err(instantiate_err)?;
        }
        let instance = linker
            .instantiate(&mut store, &self.module)
            .map_err(instantiate_err)?;

        let mut exports = BTreeMap::new();
        for (name, signature) in self.function_exports() {
            let Some(func) = instance.get_func(&mut store, &name) else {
                continue;
            };
            let entry = match signature {
                Ok(signature) => ExportEntry::Function(ExportedFunction {
                    name: name.clone(),
                    signature,
                    func,
                }),
                Err(HarnessError::UnsupportedType { ty, .. }) => ExportEntry::Unsupported(ty),
                Err(e) => ExportEntry::Unsupported(e.to_string()),
            };
            exports.insert(name, entry);
        }

        debug!(
            path = %self.path.display(),
            exports = exports.len(),
            "instantiated module"
        );

        Ok(ExecutableHandle {
            path: self.path.clone(),
            store,
            exports,
        })
    }
}

/// A function export resolved on a live instance
#[derive(Debug, Clone)]
pub struct ExportedFunction {
    name: String,
    signature: Signature,
    func: Func,
}

impl ExportedFunction {
    /// Export name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter and result types
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn func(&self) -> Func {
        self.func
    }
}

#[derive(Debug, Clone)]
enum ExportEntry {
    Function(ExportedFunction),
    Unsupported(String),
}

/// A live instance with a read-only export mapping
pub struct ExecutableHandle {
    path: PathBuf,
    store: Store<()>,
    exports: BTreeMap<String, ExportEntry>,
}

impl ExecutableHandle {
    /// Source the instance was created from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all function exports
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// Look up a function export by name
    pub fn export(&self, name: &str) -> Result<&ExportedFunction> {
        match self.exports.get(name) {
            Some(ExportEntry::Function(f)) => Ok(f),
            Some(ExportEntry::Unsupported(ty)) => Err(HarnessError::UnsupportedType {
                export: name.to_string(),
                ty: ty.clone(),
            }),
            None => Err(HarnessError::ExportNotFound {
                export: name.to_string(),
            }),
        }
    }

    pub(crate) fn store_mut(&mut self) -> &mut Store<()> {
        &mut self.store
    }
}

impl std::fmt::Debug for ExecutableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableHandle")
            .field("path", &self.path)
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDER: &str = r#"
        (module
          (func (export "add") (param i32 i32) (result i32)
            local.get 0
            local.get 1
            i32.add)
          (func (export "ref_out") (result funcref)
            ref.null func)
          (memory (export "memory") 1))
    "#;

    #[test]
    fn test_resolve_joins_base() {
        let source = BinarySource::resolve("demos/wasm", "fib_opt.wasm");
        assert_eq!(source.path(), Path::new("demos/wasm/fib_opt.wasm"));
        assert_eq!(source.stem(), "fib_opt");
    }

    #[tokio::test]
    async fn test_compile_lists_function_exports_only() {
        let loader = ModuleLoader::default();
        let module = loader
            .compile_bytes("adder.wat", ADDER.as_bytes().to_vec())
            .await
            .unwrap();

        let exports = module.function_exports();
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].0, "add");
        assert_eq!(exports[0].1.as_ref().unwrap().to_string(), "(i32, i32) -> i32");
        assert!(matches!(
            exports[1].1,
            Err(HarnessError::UnsupportedType { .. })
        ));
    }

    #[tokio::test]
    async fn test_handle_lookup() {
        let loader = ModuleLoader::default();
        let handle = loader
            .compile_bytes("adder.wat", ADDER.as_bytes().to_vec())
            .await
            .unwrap()
            .instantiate()
            .unwrap();

        assert_eq!(handle.export("add").unwrap().name(), "add");
        assert!(matches!(
            handle.export("memory"),
            Err(HarnessError::ExportNotFound { .. })
        ));
        assert!(matches!(
            handle.export("ref_out"),
            Err(HarnessError::UnsupportedType { .. })
        ));
        assert_eq!(handle.export_names().collect::<Vec<_>>(), ["add", "ref_out"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let loader = ModuleLoader::default();
        let err = loader
            .load(&BinarySource::new("does/not/exist.wasm"))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Load { .. }));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wasm");
        std::fs::write(&path, b"\0asm\x01\0\0\0\xff\xff").unwrap();

        let loader = ModuleLoader::default();
        let err = loader.load(&BinarySource::new(&path)).await.unwrap_err();
        assert!(matches!(err, HarnessError::Compile { .. }));
    }

    #[tokio::test]
    async fn test_imports_are_stubbed() {
        let wat = r#"
            (module
              (import "env" "log" (func $log (param i32)))
              (func (export "id") (param i32) (result i32) local.get 0))
        "#;
        let loader = ModuleLoader::default();
        let module = loader
            .compile_bytes("imports.wat", wat.as_bytes().to_vec())
            .await
            .unwrap();
        assert!(module.instantiate().is_ok());

        let strict = ModuleLoader::new(&EngineSettings {
            stub_imports: false,
            ..Default::default()
        })
        .unwrap();
        let module = strict
            .compile_bytes("imports.wat", wat.as_bytes().to_vec())
            .await
            .unwrap();
        assert!(matches!(
            module.instantiate(),
            Err(HarnessError::Instantiate { .. })
        ));
    }
}
