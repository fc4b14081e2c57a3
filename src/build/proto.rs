//! Protobuf code generation
//!
//! Runs before scanning so the generated `.pb.cc` sources exist when
//! the include scanner reads them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::build::module::Module;
use crate::system::{self, ChildBuilder, Error, PathExt};

/// `p/foo.proto` -> `p/foo.pb.cc`
pub fn pb_source(proto: &Path) -> PathBuf {
    proto.with_extension("pb.cc")
}

/// `p/foo.proto` -> `p/foo.pb.h`
pub fn pb_header(proto: &Path) -> PathBuf {
    proto.with_extension("pb.h")
}

/// Generate C++ sources for every declared proto. Returns the paths of
/// all generated files (header and source per proto, root-relative),
/// including those that were up to date and skipped.
pub fn generate(module: &Module) -> Result<Vec<PathBuf>, Error> {
    let mut generated = Vec::new();
    if module.protos.is_empty() {
        return Ok(generated);
    }
    let root = &module.layout.root;
    // resolved on first use so an up-to-date tree builds without protoc
    let mut protoc: Option<PathBuf> = None;

    let proto_dirs: BTreeSet<PathBuf> = module
        .protos
        .iter()
        .map(|proto| parent_dir(proto))
        .collect();

    for proto in &module.protos {
        let header = pb_header(proto);
        let source = pb_source(proto);
        generated.push(header.clone());
        generated.push(source.clone());

        if root.join(&header).exists() && root.join(&source).exists() {
            let proto_time = system::get_modified_time(root.join(proto))?;
            if system::is_up_to_date(root.join(&header), proto_time)?.is_yes()
                && system::is_up_to_date(root.join(&source), proto_time)?.is_yes()
            {
                system::verboseln!("Skipped", "{}", proto.display());
                continue;
            }
        }

        let tool = match &protoc {
            Some(tool) => tool.clone(),
            None => {
                let tool = resolve(root, &module.toolchain.protoc)?;
                protoc = Some(tool.clone());
                tool
            }
        };

        let mut args: Vec<String> = Vec::new();
        for dir in &proto_dirs {
            args.push("--proto_path".to_string());
            args.push(dir.display().to_string());
        }
        args.push(format!("--cpp_out={}", parent_dir(proto).display()));
        args.push(proto.display().to_string());

        let mut child = ChildBuilder::new(&tool)
            .current_dir(root)
            .args(&args)
            .silence_stdout()
            .pipe_stderr()
            .spawn()?;
        system::infoln!("Generating", "{}", proto.display());
        system::verboseln!("Running", "{}", child.command());
        let errors = child.collect_stderr();
        let status = child.wait()?;
        if !status.success() {
            for line in errors {
                system::errorln!("Error", "{}", line);
            }
            return Err(Error::Protoc(status));
        }
    }
    Ok(generated)
}

fn parent_dir(proto: &Path) -> PathBuf {
    match proto.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A bare name is looked up on PATH; anything with a path separator
/// resolves against the workspace root.
fn resolve(root: &Path, protoc: &str) -> Result<PathBuf, Error> {
    let path = Path::new(protoc);
    if path.is_absolute() || path.components().count() > 1 {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        full.canonicalize2()
    } else {
        which::which(protoc).map_err(|e| Error::MissingTool(protoc.to_string(), e))
    }
}
