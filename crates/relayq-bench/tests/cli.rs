use assert_cmd::Command;
use predicates::prelude::*;

fn rqbench() -> Command {
    Command::cargo_bin("rqbench").expect("rqbench binary")
}

#[test]
fn runs_default_backends() {
    rqbench()
        .args(["-n", "2000", "-c", "2", "-b", "16"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mpsc-queue"))
        .stdout(predicate::str::contains("tailq"))
        .stdout(predicate::str::contains("treiber-stack").not());
}

#[test]
fn perf_runs_only_the_primary_backend() {
    rqbench()
        .args(["--perf", "-n", "1000", "-c", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mpsc-queue"))
        .stdout(predicate::str::contains("tailq").not())
        .stdout(predicate::str::contains("treiber-stack").not());
}

#[test]
fn treiber_backend_is_opt_in() {
    rqbench()
        .args(["--with-treiber-stack", "-n", "1000", "-c", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("treiber-stack"));
}

#[test]
fn csv_output_is_machine_readable() {
    rqbench()
        .args(["--csv", "-n", "1000", "-c", "2", "-b", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "backend,elems,cores,batch,consumer_ms,producer_avg_ms,producer_0_ms,producer_1_ms",
        ))
        .stdout(predicate::str::contains("mpsc-queue,1000,2,8,"))
        .stdout(predicate::str::contains("Benchmarking").not());
}

#[test]
fn rejects_zero_batch() {
    rqbench().args(["-b", "0", "-n", "100"]).assert().failure();
}

#[test]
fn rejects_zero_cores() {
    rqbench().args(["-c", "0", "-n", "100"]).assert().failure();
}

#[test]
fn oversized_batch_is_capped() {
    rqbench()
        .args(["-n", "1000", "-c", "1", "-b", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mpsc-queue"));
}
