//! Verse of the day

use bridge_traits::time::Clock;
use chrono::Datelike;

/// Short verses rotated on the home screen.
pub const DAILY_SCRIPTURES: &[&str] = &[
    "Your word is a lamp to my feet and a light to my path. - Psalm 119:105",
    "Trust in the Lord with all your heart and lean not on your own understanding. - Proverbs 3:5",
    "I can do all things through Christ who strengthens me. - Philippians 4:13",
    "Be strong and courageous. Do not be afraid or terrified because of them, for the Lord your God goes with you. - Deuteronomy 31:6",
    "The Lord is my shepherd; I shall not want. - Psalm 23:1",
    "For God so loved the world that he gave his one and only Son, that whoever believes in him shall not perish but have eternal life. - John 3:16",
];

/// Same verse for the whole (UTC) day.
pub fn verse_of_the_day(clock: &dyn Clock) -> &'static str {
    let day = clock.now().num_days_from_ce().unsigned_abs() as usize;
    DAILY_SCRIPTURES[day % DAILY_SCRIPTURES.len()]
}
