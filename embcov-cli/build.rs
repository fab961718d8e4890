use std::process::Command;

pub fn get_git_ref() -> String {
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .and_then(|git_ref| git_ref.get(..6).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    println!("cargo:rustc-env=GIT_REF={}", get_git_ref());
    println!("cargo:rerun-if-changed=build.rs");
}
