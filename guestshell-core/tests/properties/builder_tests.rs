//! Property-based tests for command-line builders

use guestshell_core::command::tools::{virt_cat, virt_df};
use guestshell_core::{GuestfishLaunch, RunMode, Target};
use proptest::prelude::*;

fn arb_path() -> impl Strategy<Value = String> {
    "/[a-z0-9._-]{1,12}(/[a-z0-9 ._-]{1,12}){0,3}"
}

fn arb_domain() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn launch_options_follow_their_flags(
        disk in proptest::option::of(arb_path()),
        domain in proptest::option::of(arb_domain()),
        read_only in any::<bool>(),
        inspector in any::<bool>(),
    ) {
        let mut launch = GuestfishLaunch::new()
            .with_read_only(read_only)
            .with_inspector(inspector);
        if let Some(ref disk) = disk {
            launch = launch.with_disk(disk.clone());
        }
        if let Some(ref domain) = domain {
            launch = launch.with_domain(domain.clone());
        }

        let args = launch.build_args();
        if let Some(ref disk) = disk {
            let at = args.iter().position(|a| a == "-a").expect("-a present");
            prop_assert_eq!(&args[at + 1], disk);
        } else {
            prop_assert!(!args.iter().any(|a| a == "-a"));
        }
        if let Some(ref domain) = domain {
            let at = args.iter().position(|a| a == "-d").expect("-d present");
            prop_assert_eq!(&args[at + 1], domain);
        }
        prop_assert_eq!(args.iter().any(|a| a == "--ro"), read_only);
        prop_assert_eq!(args.iter().any(|a| a == "-i"), inspector);
    }

    #[test]
    fn remote_launch_only_listens(disk in arb_path(), read_only in any::<bool>()) {
        let launch = GuestfishLaunch::new()
            .with_disk(disk)
            .with_read_only(read_only)
            .with_mode(RunMode::Remote);
        prop_assert_eq!(launch.build_args(), vec!["--listen".to_string()]);
    }

    #[test]
    fn tool_targets_pick_flag(domain in arb_domain(), path in arb_path()) {
        let cmd = virt_cat(&Target::Domain(domain.clone()), &path);
        prop_assert_eq!(cmd.program.as_str(), "virt-cat");
        prop_assert_eq!(&cmd.args, &vec!["-d".to_string(), domain, path]);

        let df = virt_df(&Target::Disk(std::path::PathBuf::from("/images/vm.img")));
        prop_assert_eq!(&df.args[..2], &["-a".to_string(), "/images/vm.img".to_string()]);
    }
}
