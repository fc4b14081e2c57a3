//! Deterministic Makefile emission
//!
//! The layout is canonical and must not be reordered: notice header,
//! `.PHONY`, `all`, artifact rules, object rules, sub-module
//! trampolines, `clean`. Two runs over unchanged inputs produce
//! byte-identical output modulo the date line.

use std::collections::BTreeSet;

use chrono::Local;

use crate::build::module::Module;
use crate::build::paths;
use crate::build::rule::Rule;
use crate::system::{self, Error};

pub fn emit(module: &Module) -> Result<(), Error> {
    let mut art_rules: Vec<&Rule> = Vec::new();
    let mut obj_rules: Vec<&Rule> = Vec::new();
    let mut targets: BTreeSet<String> = BTreeSet::new();
    for artifact in &module.artifacts {
        for rule in &artifact.object_rules {
            targets.insert(rule.target().to_string());
            obj_rules.push(rule);
        }
        if let Some(rule) = &artifact.link_rule {
            targets.insert(rule.target().to_string());
            art_rules.push(rule);
        }
    }

    // make will not create target directories itself
    for target in &targets {
        if let Some(parent) = module.layout.root.join(target).parent() {
            system::ensure_directory(parent)?;
        }
    }
    // sub-workspace outputs surface under our own output directory
    for sub in &module.sub_modules {
        system::ensure_directory(&module.layout.output_dir)?;
        let original = sub.workspace.join(paths::OUTPUT_DIR).join(&sub.name);
        let link = module.layout.output_dir.join(&sub.name);
        system::symlink(&original, &link)?;
    }

    let phony = Rule::phony(".PHONY", module.phonies.clone(), "");
    let all = Rule::phony(
        "all",
        art_rules.iter().map(|r| r.target().to_string()).collect(),
        "",
    );
    let clean = Rule::clean(targets.iter().cloned().collect());

    let mut chunks: Vec<String> = Vec::new();
    chunks.push(phony.to_string());
    chunks.push(String::new());
    chunks.push(all.to_string());
    chunks.push(String::new());
    chunks.push(String::new());
    chunks.extend(art_rules.iter().map(|r| r.to_string()));
    chunks.push(String::new());
    chunks.extend(obj_rules.iter().map(|r| r.to_string()));
    chunks.push(String::new());
    for sub in &module.sub_modules {
        let trampoline = Rule::phony(
            &sub.name,
            Vec::new(),
            format!("make -C {}", sub.workspace.display()),
        );
        chunks.push(trampoline.to_string());
        chunks.push(String::new());
    }
    chunks.push(String::new());
    chunks.push(clean.to_string());

    let notice = format!(
        "# file : Makefile\n\
         # brief: this file was generated by `biu`\n\
         # date : {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let mut out = notice;
    out.push('\n');
    out.push('\n');
    for chunk in chunks {
        out.push_str(&chunk);
        out.push('\n');
    }

    system::write_file(&module.layout.makefile, &out)?;
    system::infoln!("Generated", "{}", module.layout.makefile.display());
    Ok(())
}
