use std::process::Command;

// Capture the VCS state so the version can be derived at compile time.
fn main() {
    println!("cargo:rerun-if-env-changed=Q2_STATS_GIT_DESCRIBE");

    if let Ok(describe) = std::env::var("Q2_STATS_GIT_DESCRIBE") {
        println!("cargo:rustc-env=Q2_STATS_GIT_DESCRIBE={}", describe.trim());
        return;
    }

    let output = Command::new("git")
        .args(["describe", "--tags", "--long", "--dirty", "--always"])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let describe = String::from_utf8_lossy(&out.stdout);
            println!("cargo:rustc-env=Q2_STATS_GIT_DESCRIBE={}", describe.trim());
        }
        _ => println!("cargo:warning=git describe unavailable, version falls back to 0.0.0+notfound"),
    }

    if let Ok(out) = Command::new("git").args(["rev-parse", "--git-dir"]).output() {
        if out.status.success() {
            let git_dir = String::from_utf8_lossy(&out.stdout).trim().to_string();
            println!("cargo:rerun-if-changed={}/HEAD", git_dir);
            println!("cargo:rerun-if-changed={}/refs/tags", git_dir);
        }
    }
}
