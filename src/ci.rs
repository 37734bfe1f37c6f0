//! Generator for the `.travis.yml` build matrix of the `dune-gdt` module.
//!
//! Tests are split into `builder_count` groups, each run once per compiler image.

use crate::error::Result;

use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = ".travis.yml";

/// Docker image tags of the compilers, in matrix order.
pub const COMPILERS: [(&str, &str); 2] = [("gcc-5", "gcc 5"), ("clang-3.9", "clang 3.9")];

const HEADER: &str = r#"# This file is part of the dune-gdt project:
#   https://github.com/dune-community/dune-gdt
# Copyright 2010-2016 dune-gdt developers and contributors. All rights reserved.
# License: BSD 2-Clause License (http://opensource.org/licenses/BSD-2-Clause)
# Authors:
#   Felix Schindler (2016)

# THIS FILE IS AUTOGENERATED -- DO NOT EDIT #


sudo: required
dist: trusty
language: generic
services: docker

before_script:
    - export IMAGE="dunecommunity/${MY_MODULE}-testing:${DOCKER_TAG}_${TRAVIS_BRANCH}"
    # get image with fallback to master branch of the super repo
    - docker pull ${IMAGE} || export IMAGE="dunecommunity/${MY_MODULE}-testing:${DOCKER_TAG}_master" ; docker pull ${IMAGE}
    - export ENV_FILE=${HOME}/env
    - printenv | \grep TRAVIS > ${ENV_FILE}
    - printenv | \grep encrypt >> ${ENV_FILE}
    - printenv | \grep TEST >> ${ENV_FILE}
    - printenv | \grep TOKEN >> ${ENV_FILE}
    - export DOCKER_RUN="docker run --env-file ${ENV_FILE} -v ${TRAVIS_BUILD_DIR}:/root/src/${MY_MODULE} ${IMAGE}"

script:
    - ${DOCKER_RUN} /root/src/${MY_MODULE}/.travis.script.bash

# runs independent of 'script' failure/success
after_script:
    - ${DOCKER_RUN} /root/src/${MY_MODULE}/.travis.after_script.bash

notifications:
  email:
    on_success: change
    on_failure: change
    on_start: never
  webhooks:
    urls:
      - https://buildtimetrend.herokuapp.com/travis
      - https://webhooks.gitter.im/e/2a38e80d2722df87f945

branches:
  except:
    - gh-pages

env:
  global:
    - MY_MODULE=dune-gdt

matrix:
  include:"#;

const FOOTER: &str = "\n\n# THIS FILE IS AUTOGENERATED -- DO NOT EDIT #";

/// The build matrix with one entry per builder and compiler.
pub fn render_travis_yml(builder_count: usize) -> String {
  let mut yml = String::from(HEADER);
  for (tag, label) in COMPILERS {
    yml.push_str(&format!("\n#   {label}"));
    for builder in 0..builder_count {
      yml.push_str(&format!("\n    - env: DOCKER_TAG={tag} TESTS={builder}"));
    }
  }
  yml.push_str(FOOTER);
  yml
}

/// Renders the build matrix into `dir/.travis.yml`, replacing any existing file.
pub fn write_travis_yml(dir: impl AsRef<Path>, builder_count: usize) -> Result<PathBuf> {
  let path = dir.as_ref().join(FILE_NAME);
  std::fs::write(&path, render_travis_yml(builder_count))?;
  tracing::info!("wrote {} with {builder_count} builders", path.display());
  Ok(path)
}

#[cfg(test)]
mod test {
  use super::{render_travis_yml, write_travis_yml};

  #[test]
  fn matrix_entries_per_compiler() {
    let yml = render_travis_yml(3);
    let entries: Vec<&str> = yml
      .lines()
      .filter(|l| l.trim_start().starts_with("- env:"))
      .collect();
    assert_eq!(
      entries,
      [
        "    - env: DOCKER_TAG=gcc-5 TESTS=0",
        "    - env: DOCKER_TAG=gcc-5 TESTS=1",
        "    - env: DOCKER_TAG=gcc-5 TESTS=2",
        "    - env: DOCKER_TAG=clang-3.9 TESTS=0",
        "    - env: DOCKER_TAG=clang-3.9 TESTS=1",
        "    - env: DOCKER_TAG=clang-3.9 TESTS=2",
      ]
    );
    assert!(yml.contains("  include:\n#   gcc 5\n    - env: DOCKER_TAG=gcc-5 TESTS=0\n"));
    assert!(yml.contains("TESTS=2\n#   clang 3.9\n"));
    assert!(yml.ends_with("TESTS=2\n\n# THIS FILE IS AUTOGENERATED -- DO NOT EDIT #"));
  }

  #[test]
  fn no_builders() {
    let yml = render_travis_yml(0);
    assert!(yml.contains("  include:\n#   gcc 5\n#   clang 3.9\n\n# THIS FILE"));
    assert!(!yml.contains("DOCKER_TAG=gcc-5"));
  }

  #[test]
  fn writes_file() {
    let dir = std::env::temp_dir().join(format!("travis-yml-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = write_travis_yml(&dir, 2).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, render_travis_yml(2));
    std::fs::remove_dir_all(&dir).unwrap();
  }
}
