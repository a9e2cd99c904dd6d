use predicates::str;
use rstest::rstest;
use test_utilities::{BINARY_NAME, mapmosaic_cmd};

#[test]
fn command() {
	mapmosaic_cmd()
		.assert()
		.failure()
		.code(2)
		.stdout(str::is_empty())
		.stderr(str::contains(format!("Usage: {BINARY_NAME} [OPTIONS] <COMMAND>")));
}

#[rstest]
#[case("render", "[OPTIONS] <OUTPUT>")]
fn subcommand(#[case] sub_command: &str, #[case] usage: &str) {
	mapmosaic_cmd()
		.args(sub_command.split(' '))
		.assert()
		.failure()
		.code(2)
		.stdout(str::is_empty())
		.stderr(str::contains(format!("Usage: {BINARY_NAME} {sub_command} {usage}")));
}

#[test]
fn plan_prints_the_tile_table() {
	mapmosaic_cmd()
		.args(["plan", "--renderbuffer-size=512"])
		.assert()
		.success()
		.stdout(str::starts_with("image:      1202x1602 rgba"))
		.stdout(str::contains("3 columns x 4 rows"))
		.stdout(str::contains("     2    3    512    768     89     33"));
}

#[test]
fn plan_rejects_invalid_bbox() {
	mapmosaic_cmd()
		.args(["plan", "--bbox=10,0,-10,5"])
		.assert()
		.failure()
		.stdout(str::is_empty())
		.stderr(str::contains("invalid bbox"));
}

#[test]
fn plan_rejects_tiny_renderbuffer() {
	mapmosaic_cmd()
		.args(["plan", "--renderbuffer-size=1"])
		.assert()
		.failure()
		.stderr(str::contains("too small for pixel ratio 2"));
}
