// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{create_test_operator, create_test_persistence};
use pep_report_domain::{Language, Settings, Timezone};

#[test]
fn test_defaults_when_nothing_saved() {
    let mut persistence = create_test_persistence();

    assert_eq!(persistence.get_settings().unwrap(), Settings::default());
}

#[test]
fn test_saved_settings_are_loaded_and_overwritten() {
    let mut persistence = create_test_persistence();
    let admin = create_test_operator(&mut persistence, "admin@pep.example", "admin");

    let mut settings = Settings::default();
    settings.system.language = Language::English;
    settings.system.timezone = Timezone::new("Asia/Makassar").unwrap();
    persistence.save_settings(&settings, admin).unwrap();
    assert_eq!(persistence.get_settings().unwrap(), settings);

    settings.security.session_timeout_minutes = 60;
    persistence.save_settings(&settings, admin).unwrap();
    assert_eq!(
        persistence
            .get_settings()
            .unwrap()
            .security
            .session_timeout_minutes,
        60
    );
}
