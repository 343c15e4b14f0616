use std::process::Command;

fn main() {
    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let git_rev = Command::new("git")
        .args(&["describe", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let version = if git_rev.is_empty() {
        pkg_version
    } else {
        format!("{}-{}", pkg_version, git_rev)
    };
    println!("cargo:rustc-env=VERSION_STRING={}", version);
    println!("cargo:rerun-if-changed=build.rs");
}
