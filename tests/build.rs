//! End-to-end workspace scenarios: evaluate a BUILD tree, inspect the
//! generated Makefile and build state, never invoke make itself.

use std::fs;
use std::path::{Path, PathBuf};

use biu::build;
use biu::Options;

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn touch(root: &Path, target: &str) {
    let path = root.join(target);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "x").unwrap();
}

fn run(root: &Path) {
    build::run(root.to_str().unwrap(), &Options::default()).unwrap();
}

fn workspace(dir: &tempfile::TempDir) -> PathBuf {
    let root = dir.path().join("ws");
    fs::create_dir(&root).unwrap();
    root
}

fn makefile(root: &Path) -> String {
    fs::read_to_string(root.join("Makefile")).unwrap()
}

#[test]
fn single_binary_with_header_closure() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "a.cc", "#include \"a.h\"\nint main() { return 0; }\n");
    write(&root, "a.h", "#pragma once\n");
    write(
        &root,
        "BUILD",
        r#"
        [flags]
        cxxflags = ["-O2"]

        [[binary]]
        name = "app"
        sources = ["a.cc"]
        "#,
    );

    run(&root);

    let text = makefile(&root);
    assert!(text.contains(
        "output/ws/objs/app/a.cc.o : a.cc \\\n\ta.h\n\
         \tg++ -o output/ws/objs/app/a.cc.o -c -O2 a.cc\n"
    ));
    assert!(text.contains(
        "output/ws/bin/app : output/ws/objs/app/a.cc.o\n\
         \tg++ -o output/ws/bin/app -Wl,-E output/ws/objs/app/a.cc.o \
         -Xlinker \"-(\" -Xlinker \"-)\"\n"
    ));
    assert!(text.contains("\nall : output/ws/bin/app\n"));
    assert!(text.contains(".PHONY : all \\\n\tclean\n"));
    // emitter prepared the target directories for make
    assert!(root.join("output/ws/objs/app").is_dir());
    assert!(root.join("output/ws/bin").is_dir());
}

#[test]
fn static_library_uses_ar_and_the_c_branch() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "z.c", "int z(void) { return 0; }\n");
    write(
        &root,
        "BUILD",
        r#"
        [flags]
        cflags = ["-g"]

        [[library]]
        name = "libz.a"
        sources = ["z.c"]
        "#,
    );

    run(&root);

    let text = makefile(&root);
    assert!(text.contains(
        "output/ws/lib/libz.a : output/ws/objs/libz.a/z.c.o\n\
         \tar rcs output/ws/lib/libz.a output/ws/objs/libz.a/z.c.o\n"
    ));
    assert!(text.contains("gcc -o output/ws/objs/libz.a/z.c.o -c -g z.c"));
}

#[test]
fn flag_change_invalidates_objects_and_their_consumers() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "a.cc", "int main() { return 0; }\n");
    let build_file = |cxxflags: &str| {
        format!(
            r#"
            [flags]
            cxxflags = ["{cxxflags}"]

            [[binary]]
            name = "app"
            sources = ["a.cc"]
            "#
        )
    };
    write(&root, "BUILD", &build_file("-O2"));
    run(&root);

    // pretend make ran
    touch(&root, "output/ws/objs/app/a.cc.o");
    touch(&root, "output/ws/bin/app");

    // no input change: nothing is deleted
    run(&root);
    assert!(root.join("output/ws/objs/app/a.cc.o").exists());
    assert!(root.join("output/ws/bin/app").exists());

    // flip one flag: the object and the downstream binary both go
    write(&root, "BUILD", &build_file("-O3"));
    run(&root);
    assert!(!root.join("output/ws/objs/app/a.cc.o").exists());
    assert!(!root.join("output/ws/bin/app").exists());
}

#[test]
fn removed_artifact_expires_its_targets() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "a.cc", "");
    write(&root, "b.cc", "");
    write(
        &root,
        "BUILD",
        r#"
        [[binary]]
        name = "app"
        sources = ["a.cc"]

        [[binary]]
        name = "tool"
        sources = ["b.cc"]
        "#,
    );
    run(&root);
    touch(&root, "output/ws/objs/tool/b.cc.o");
    touch(&root, "output/ws/bin/tool");
    touch(&root, "output/ws/bin/app");

    write(
        &root,
        "BUILD",
        r#"
        [[binary]]
        name = "app"
        sources = ["a.cc"]
        "#,
    );
    run(&root);
    assert!(!root.join("output/ws/objs/tool/b.cc.o").exists());
    assert!(!root.join("output/ws/bin/tool").exists());
    assert!(root.join("output/ws/bin/app").exists());
}

#[test]
fn sub_module_trampoline_prereq_and_symlink() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "main.cc", "int main() { return 0; }\n");
    write(&root, "sub/s.c", "int s(void) { return 0; }\n");
    write(
        &root,
        "sub/BUILD",
        r#"
        [[library]]
        name = "libsub.a"
        sources = ["s.c"]
        "#,
    );
    write(
        &root,
        "BUILD",
        r#"
        [[submodule]]
        workspace = "./sub"
        libs = ["libsub.a"]

        [[binary]]
        name = "app"
        sources = ["main.cc"]
        "#,
    );

    run(&root);

    let sub_abs = fs::canonicalize(root.join("sub")).unwrap();
    let text = makefile(&root);
    // phony trampoline drives the nested Makefile
    assert!(text.contains(&format!("\nsub : \n\tmake -C {}\n", sub_abs.display())));
    assert!(text.contains(".PHONY : all \\\n\tclean \\\n\tsub\n"));
    // the imported library is both a prereq and an ldlib
    assert!(text.contains(
        "output/ws/bin/app : output/ws/objs/app/main.cc.o \\\n\
         \toutput/sub/lib/libsub.a\n"
    ));
    assert!(text.contains("-Xlinker \"-(\" output/sub/lib/libsub.a -Xlinker \"-)\""));

    // the sub-workspace got its own independent Makefile
    let sub_text = fs::read_to_string(sub_abs.join("Makefile")).unwrap();
    assert!(sub_text.contains("ar rcs output/sub/lib/libsub.a"));

    // unified discovery through the symlink
    let link = root.join("output/sub");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), sub_abs.join("output/sub"));

    // both workspaces are recorded for clean
    let modules = fs::read_to_string(root.join(".biu/modules")).unwrap();
    let root_abs = fs::canonicalize(&root).unwrap();
    assert!(modules.contains(&root_abs.display().to_string()));
    assert!(modules.contains(&sub_abs.display().to_string()));
}

#[test]
fn proto_generation_feeds_sources_and_clean() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "p/foo.proto", "syntax = \"proto3\";\n");
    write(
        &root,
        "fake-protoc",
        "#!/bin/sh\necho \"$@\" > protoc-args.txt\ntouch p/foo.pb.cc p/foo.pb.h\n",
    );
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(root.join("fake-protoc"), fs::Permissions::from_mode(0o755))
            .unwrap();
    }
    write(
        &root,
        "BUILD",
        r#"
        [toolchain]
        protoc = "./fake-protoc"

        [[binary]]
        name = "app"
        protos = ["p/foo.proto"]
        "#,
    );

    run(&root);

    // protoc ran with the proto dir as --proto_path and --cpp_out
    let args = fs::read_to_string(root.join("protoc-args.txt")).unwrap();
    assert_eq!(args.trim(), "--proto_path p --cpp_out=p p/foo.proto");

    // the generated source joined the artifact
    let text = makefile(&root);
    assert!(text.contains("output/ws/objs/app/p/foo.pb.cc.o : p/foo.pb.cc"));

    // both generated files are recorded
    let protos = fs::read_to_string(root.join(".biu/protos")).unwrap();
    assert!(protos.contains("p/foo.pb.h"));
    assert!(protos.contains("p/foo.pb.cc"));

    // and clean removes them along with everything else
    build::clean(root.to_str().unwrap(), &Options::default()).unwrap();
    assert!(!root.join("p/foo.pb.cc").exists());
    assert!(!root.join("p/foo.pb.h").exists());
    assert!(root.join("p/foo.proto").exists());
}

#[test]
fn transitive_headers_appear_in_discovery_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "a.cc", "#include \"a.h\"\n");
    write(&root, "a.h", "#include \"b.h\"\n");
    write(&root, "b.h", "");
    write(
        &root,
        "BUILD",
        r#"
        [[binary]]
        name = "app"
        sources = ["a.cc"]
        "#,
    );

    run(&root);

    let text = makefile(&root);
    assert!(text.contains("output/ws/objs/app/a.cc.o : a.cc \\\n\ta.h \\\n\tb.h\n"));
}

#[test]
fn rebuilds_are_byte_identical_modulo_the_date() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "a.cc", "#include \"a.h\"\n");
    write(&root, "a.h", "");
    write(&root, "b.cc", "");
    write(
        &root,
        "BUILD",
        r#"
        [flags]
        cxxflags = ["-O2", "-Wall"]
        ldlibs = ["-lpthread", "-lz"]

        [[binary]]
        name = "app"
        sources = ["*.cc"]

        [[test]]
        name = "app_test"
        sources = ["b.cc"]
        "#,
    );

    run(&root);
    let first = makefile(&root);
    run(&root);
    let second = makefile(&root);

    let strip = |text: &str| {
        text.lines()
            .filter(|line| !line.starts_with("# date"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(strip(&first), strip(&second));
    // tests land under test/, not bin/
    assert!(first.contains("output/ws/test/app_test : "));
}

#[test]
fn clean_removes_all_build_state() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "a.cc", "");
    write(
        &root,
        "BUILD",
        r#"
        [[binary]]
        name = "app"
        sources = ["a.cc"]
        "#,
    );

    run(&root);
    touch(&root, "output/ws/bin/app");
    assert!(root.join("Makefile").exists());
    assert!(root.join(".biu/targets").exists());

    build::clean(root.to_str().unwrap(), &Options::default()).unwrap();
    assert!(!root.join("Makefile").exists());
    assert!(!root.join(".biu").exists());
    assert!(!root.join("output").exists());
    assert!(root.join("BUILD").exists());
}

#[test]
fn artifact_overrides_append_to_workspace_flags() {
    let dir = tempfile::tempdir().unwrap();
    let root = workspace(&dir);
    write(&root, "a.cc", "");
    write(&root, "b.cc", "");
    write(
        &root,
        "BUILD",
        r#"
        [flags]
        cxxflags = ["-O2"]

        [[binary]]
        name = "plain"
        sources = ["a.cc"]

        [[binary]]
        name = "fast"
        sources = ["b.cc"]
        cxxflags = ["-O3"]
        "#,
    );

    run(&root);

    let text = makefile(&root);
    assert!(text.contains("g++ -o output/ws/objs/plain/a.cc.o -c -O2 a.cc"));
    assert!(text.contains("g++ -o output/ws/objs/fast/b.cc.o -c -O2 -O3 b.cc"));
}
