//! Host tool availability checks.

use crate::config::Toolchain;
use crate::process::CommandTemplate;

use super::types::CheckResult;

/// Check that every configured command's program resolves.
///
/// The extract-xiso compatible commands are only needed by one case, so a
/// missing program there is a warning.
pub fn check_toolchain(toolchain: &Toolchain) -> Vec<CheckResult> {
    let required = [
        ("pack", &toolchain.pack),
        ("unpack", &toolchain.unpack),
        ("repack", &toolchain.repack),
        ("build-image", &toolchain.build_image),
        ("image-spec", &toolchain.image_spec),
        ("copy-out", &toolchain.copy_out),
    ];
    let optional = [
        ("exiso pack", &toolchain.exiso.pack),
        ("exiso unpack -x", &toolchain.exiso.unpack_x),
        ("exiso unpack", &toolchain.exiso.unpack_plain),
        ("exiso repack", &toolchain.exiso.repack_in_place),
    ];

    let mut results = Vec::new();
    for (name, command) in required {
        results.push(check_command(name, command, true));
    }
    for (name, command) in optional {
        results.push(check_command(name, command, false));
    }
    results
}

fn check_command(name: &str, command: &CommandTemplate, required: bool) -> CheckResult {
    let program = command.program();
    match which::which(program) {
        Ok(path) => CheckResult::pass_with(name, &path.display().to_string()),
        Err(_) => {
            let msg = format!("'{}' not found. Set its IMGCHECK_*_CMD or put it on PATH", program);
            if required {
                CheckResult::fail(name, &msg)
            } else {
                CheckResult::warn(name, &msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::preflight::types::CheckStatus;

    #[test]
    fn missing_program_fails_required_and_warns_optional() {
        let config = Config::from_vars(|key| match key {
            "IMGCHECK_TOOL" => Some("nonexistent_program_12345".into()),
            "IMGCHECK_PACK_CMD" => Some("sh -c true".into()),
            _ => None,
        })
        .unwrap();

        let results = check_toolchain(&config.toolchain);
        assert_eq!(results.len(), 10);
        assert_eq!(results[0].status, CheckStatus::Pass);
        assert_eq!(results[1].status, CheckStatus::Fail);
        assert_eq!(results[6].status, CheckStatus::Warn);
    }
}
