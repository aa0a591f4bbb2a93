mod common;

use common::Result;
use mizkit::parking::{ParkingSpot, nearest_spot};
use mizkit::sltp;
use mizkit::value::{KeyRef, LuaValue, lookup};
use mizkit::{Category, Error, IdKind, Mission, Side};
use pretty_assertions::assert_eq;

fn load() -> Result<Mission> {
    load_from(common::MISSION)
}

fn load_from(mission: &str) -> Result<Mission> {
    let (mission, _) = sltp::decode(mission)?;
    let (dictionary, _) = sltp::decode(common::DICTIONARY)?;
    Ok(Mission::from_tables(mission, dictionary))
}

fn names(groups: &[mizkit::mission::Group]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for group in groups {
        out.push(group.name()?);
    }
    Ok(out)
}

#[test]
fn reads_mission_header() -> Result<()> {
    let mission = load()?;
    assert_eq!(mission.theatre()?, "Caucasus");
    assert_eq!(mission.start_time()?, 43200);
    assert_eq!(mission.sortie()?, "Opération Café");
    assert_eq!(mission.description_text()?, "Strike the bridge.\nReturn to base.");
    assert_eq!(mission.description_blue_task()?, "Destroy the bridge");
    assert_eq!(mission.description_red_task()?, "");
    Ok(())
}

#[test]
fn walks_coalitions_countries_and_groups() -> Result<()> {
    let mission = load()?;
    assert_eq!(mission.blue().name()?, "blue");
    assert_eq!(mission.blue().bullseye()?, (-291014.0, 617414.0));

    let countries = mission.coalition(Side::Red).countries()?;
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].name()?, "Russia");
    assert_eq!(countries[0].id()?, 0);
    assert_eq!(countries[0].side(), Side::Red);

    assert_eq!(names(&mission.groups()?)?, vec!["Hawg Flight", "Navy", "Armor"]);
    assert_eq!(names(&mission.get_groups_from_category("ship")?)?, vec!["Navy"]);
    assert_eq!(names(&mission.get_clients_groups()?)?, vec!["Hawg Flight"]);
    assert_eq!(mission.units()?.len(), 4);
    Ok(())
}

#[test]
fn lookups_return_none_for_absent_and_reject_malformed_queries() -> Result<()> {
    let mission = load()?;

    let hawg = mission.get_group_by_id(1)?.ok_or("group 1")?;
    assert_eq!(hawg.name()?, "Hawg Flight");
    assert_eq!(hawg.category(), Category::Helicopter);
    assert!(mission.get_group_by_name("Nobody")?.is_none());
    assert!(mission.get_unit_by_id(99)?.is_none());

    assert!(matches!(mission.get_group_by_name("  "), Err(Error::Validation(_))));
    assert!(matches!(mission.get_group_by_id(0), Err(Error::Validation(_))));
    assert!(matches!(mission.get_unit_by_id(-3), Err(Error::Validation(_))));
    assert!(matches!(mission.get_groups_from_category("tank"), Err(Error::Validation(_))));
    assert!(matches!(mission.get_country_by_id(-1), Err(Error::Validation(_))));

    let usa = mission.get_country_by_id(2)?.ok_or("country 2")?;
    assert_eq!(usa.name()?, "USA");
    let unit = usa.get_unit_by_name("Hawg 1-2")?.ok_or("unit")?;
    assert_eq!(unit.base().id()?, 2);
    assert!(mission.red().get_unit_by_name("Hawg 1-2")?.is_none());
    Ok(())
}

#[test]
fn unit_views_follow_group_category() -> Result<()> {
    let mission = load()?;
    let lead = mission.get_unit_by_name("Hawg 1-1")?.ok_or("lead")?;
    let flying = lead.as_flying().ok_or("helicopter units fly")?;
    assert_eq!(flying.onboard_num()?, "010");
    assert_eq!(flying.parking()?, Some("21".to_string()));
    assert_eq!(flying.parking_id()?, Some("G21".to_string()));
    assert_eq!(flying.base().skill()?, "Client");

    let tank = mission.get_unit_by_id(3)?.ok_or("tank")?;
    assert_eq!(tank.category(), Category::Vehicle);
    assert!(tank.as_flying().is_none());
    assert_eq!(tank.base().unit_type()?, "T-80UD");
    Ok(())
}

#[test]
fn ids_are_allocated_past_the_maximum() -> Result<()> {
    let mission = load()?;
    assert_eq!(mission.next_group_id()?, 4);
    assert_eq!(mission.next_unit_id()?, 5);
    Ok(())
}

#[test]
fn duplicate_ids_are_reported() -> Result<()> {
    let mission = load_from(&common::MISSION.replace("[\"unitId\"] = 4,", "[\"unitId\"] = 2,"))?;
    match mission.next_unit_id() {
        Err(Error::DuplicateId { kind, id }) => {
            assert_eq!(kind, IdKind::Unit);
            assert_eq!(id, 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(mission.next_group_id()?, 4);
    Ok(())
}

#[test]
fn set_id_refuses_taken_ids() -> Result<()> {
    let mission = load()?;
    let navy = mission.get_group_by_name("Navy")?.ok_or("navy")?;
    assert!(matches!(navy.set_id(1), Err(Error::DuplicateId { kind: IdKind::Group, id: 1 })));
    navy.set_id(3)?;
    navy.set_id(10)?;
    assert_eq!(mission.next_group_id()?, 11);
    assert!(mission.get_group_by_id(3)?.is_none());
    assert_eq!(mission.get_group_by_id(10)?.ok_or("moved")?.name()?, "Navy");

    let tank = mission.get_unit_by_id(3)?.ok_or("tank")?;
    assert!(matches!(tank.base().set_id(4), Err(Error::DuplicateId { kind: IdKind::Unit, id: 4 })));
    Ok(())
}

#[test]
fn renaming_refreshes_cached_lookups() -> Result<()> {
    let mission = load()?;
    let group = mission.get_group_by_name("Hawg Flight")?.ok_or("group")?;
    group.set_name("Viper Flight")?;
    assert!(mission.get_group_by_name("Hawg Flight")?.is_none());
    assert_eq!(mission.get_group_by_name("Viper Flight")?.ok_or("renamed")?.id()?, 1);
    assert!(matches!(group.set_name(""), Err(Error::Validation(_))));
    Ok(())
}

#[test]
fn start_date_is_a_bijection_with_start_time() -> Result<()> {
    let mission = load()?;
    mission.set_start_time_as_date("01/06/2011 12:00:00")?;
    assert_eq!(mission.start_time()?, 1_306_929_600);

    mission.set_start_time(0)?;
    assert_eq!(mission.start_time_as_date()?, "01/01/1970 00:00:00");
    mission.set_start_time(1_306_929_600)?;
    assert_eq!(mission.start_time_as_date()?, "01/06/2011 12:00:00");

    for bad in ["2011-06-01 12:00:00", "32/13/2011 00:00:00", "01/06/2011"] {
        assert!(matches!(mission.set_start_time_as_date(bad), Err(Error::Validation(_))), "{bad}");
    }
    assert!(matches!(mission.set_start_time(-1), Err(Error::Validation(_))));
    assert_eq!(mission.start_time()?, 1_306_929_600);
    Ok(())
}

#[test]
fn group_fields_are_validated() -> Result<()> {
    let mission = load()?;
    let hawg = mission.get_group_by_name("Hawg Flight")?.ok_or("hawg")?;
    assert_eq!(hawg.frequency()?, 124.0);
    hawg.set_frequency(251.0)?;
    assert!(matches!(hawg.set_frequency(401.0), Err(Error::Validation(_))));
    assert!(!hawg.late_activation()?);
    hawg.set_late_activation(true)?;
    assert!(hawg.late_activation()?);

    let armor = mission.get_group_by_name("Armor")?.ok_or("armor")?;
    assert!(matches!(armor.frequency(), Err(Error::TypeMismatch { .. })));
    assert!(matches!(armor.set_start_time(-5), Err(Error::Validation(_))));
    assert!(mission.get_group_by_name("Navy")?.ok_or("navy")?.hidden()?);
    Ok(())
}

#[test]
fn radio_presets_follow_the_aircraft_type() -> Result<()> {
    let mission = load()?;
    let lead = mission.get_unit_by_name("Hawg 1-1")?.ok_or("lead")?;
    let flying = lead.as_flying().ok_or("flying")?;

    let presets = flying.radio_presets()?;
    let slots: Vec<(i64, &str)> = presets.iter().map(|p| (p.slot(), p.name())).collect();
    assert_eq!(slots, vec![(1, "R-828"), (2, "ARK-22")]);

    let vhf = flying.radio(1)?;
    assert_eq!(vhf.channels_qty(), 10);
    assert_eq!(vhf.frequency(2)?, 25.7);
    assert!(matches!(vhf.frequency(11), Err(Error::Validation(_))));
    assert!(matches!(vhf.set_frequency(1, 60.0), Err(Error::Validation(_))));
    assert!(matches!(flying.radio(3), Err(Error::Validation(_))));

    let adf = flying.radio_by_name("ARK-22")?.ok_or("adf")?;
    assert_eq!(adf.slot(), 2);
    assert!(flying.radio_by_name("AN/ARC-164")?.is_none());

    flying.base().set_unit_type("UH-1H")?;
    assert!(flying.radio_by_name("ARK-22")?.is_none());
    flying.base().set_unit_type("Ka-50")?;
    Ok(())
}

#[test]
fn removing_a_group_from_another_country_fails() -> Result<()> {
    let mission = load()?;
    let usa = mission.get_country_by_name("USA")?.ok_or("usa")?;
    let armor = mission.get_group_by_name("Armor")?.ok_or("armor")?;
    assert!(matches!(usa.remove_group(&armor), Err(Error::MissingField { .. })));

    let russia = mission.get_country_by_name("Russia")?.ok_or("russia")?;
    russia.remove_group(&armor)?;
    assert_eq!(names(&russia.groups()?)?, vec!["Navy"]);
    assert!(mission.get_group_by_id(2)?.is_none());
    Ok(())
}

#[test]
fn unit_snaps_to_nearest_parking_spot() -> Result<()> {
    let mission = load()?;
    let spots = vec![
        ParkingSpot::new(7, "G07", -281700.0, 647360.0),
        ParkingSpot::new(8, "G08", -281740.0, 647390.0),
    ];

    let wing = mission.get_unit_by_name("Hawg 1-2")?.ok_or("wing")?;
    let flying = wing.as_flying().ok_or("flying")?;
    let (x, y) = flying.base().position()?;
    let spot = nearest_spot(&spots, x, y, 50.0).ok_or("no spot")?;
    flying.snap_to_parking(spot)?;

    assert_eq!(flying.parking()?, Some("8".to_string()));
    assert_eq!(flying.parking_id()?, Some("G08".to_string()));
    assert_eq!(flying.base().position()?, (-281740.0, 647390.0));
    // `parking` was written as a number and stays one.
    mission.with_tables(|m, _| {
        let parking = lookup(
            m,
            &[
                KeyRef::Str("coalition"),
                KeyRef::Str("blue"),
                KeyRef::Str("country"),
                KeyRef::Int(1),
                KeyRef::Str("helicopter"),
                KeyRef::Str("group"),
                KeyRef::Int(1),
                KeyRef::Str("units"),
                KeyRef::Int(2),
                KeyRef::Str("parking"),
            ],
        );
        assert_eq!(parking, Some(&LuaValue::from(8_i64)));
    });
    Ok(())
}

#[test]
fn unit_positions_project_onto_the_theatre() -> Result<()> {
    let mission = load()?;
    let projection = mission.projection()?.ok_or("known theatre")?;
    let lead = mission.get_unit_by_name("Hawg 1-1")?.ok_or("lead")?;
    let (lat, lon) = lead.base().lat_lon(&projection)?;
    assert!((40.0..46.0).contains(&lat), "{lat}");
    assert!((37.0..47.0).contains(&lon), "{lon}");
    Ok(())
}

#[test]
fn heading_and_skill_are_checked() -> Result<()> {
    let mission = load()?;
    let tank = mission.get_unit_by_name("Armor-1")?.ok_or("tank")?;
    tank.base().set_heading(3.0)?;
    assert!(matches!(tank.base().set_heading(7.0), Err(Error::Validation(_))));
    tank.base().set_skill("High")?;
    assert!(matches!(tank.base().set_skill("Godlike"), Err(Error::Validation(_))));
    assert_eq!(tank.base().skill()?, "High");
    Ok(())
}

#[test]
fn weather_bounds_are_inclusive() -> Result<()> {
    let mission = load()?;
    let weather = mission.weather();
    for ok in [200, 2000] {
        weather.set_cloud_thickness(ok)?;
    }
    for bad in [199, 2001] {
        assert!(matches!(weather.set_cloud_thickness(bad), Err(Error::Validation(_))), "{bad}");
    }
    assert_eq!(weather.cloud_thickness()?, 2000);

    weather.set_temperature(-50)?;
    weather.set_temperature(50)?;
    assert!(matches!(weather.set_temperature(51), Err(Error::Validation(_))));
    assert!(matches!(weather.set_dust_density(299), Err(Error::Validation(_))));
    Ok(())
}

#[test]
fn non_finite_numbers_are_rejected() -> Result<()> {
    let mission = load()?;
    let hawg = mission.get_group_by_name("Hawg Flight")?.ok_or("hawg")?;
    let lead = mission.get_unit_by_name("Hawg 1-1")?.ok_or("lead")?;
    let flying = lead.as_flying().ok_or("flying")?;

    for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(matches!(hawg.set_frequency(n), Err(Error::Validation(_))), "{n}");
        assert!(matches!(flying.radio(1)?.set_frequency(1, n), Err(Error::Validation(_))), "{n}");
        assert!(matches!(flying.base().set_heading(n), Err(Error::Validation(_))), "{n}");
        assert!(matches!(flying.set_altitude(n), Err(Error::Validation(_))), "{n}");
        assert!(matches!(flying.set_speed(n), Err(Error::Validation(_))), "{n}");
    }
    assert_eq!(hawg.frequency()?, 124.0);
    assert_eq!(flying.radio(1)?.frequency(1)?, 21.5);
    Ok(())
}

#[test]
fn temperature_change_adjusts_precipitation_after_density_drops() -> Result<()> {
    let mission = load()?;
    let weather = mission.weather();
    weather.set_cloud_density(5)?;
    weather.set_precipitations(1)?;
    weather.set_cloud_density(0)?;

    weather.set_temperature(-5)?;
    assert_eq!(weather.temperature()?, -5);
    assert_eq!(weather.precipitations()?, 3);

    assert!(matches!(weather.set_temperature(60), Err(Error::Validation(_))));
    assert_eq!(weather.temperature()?, -5);
    assert_eq!(weather.precipitations()?, 3);
    Ok(())
}

#[test]
fn snow_does_not_survive_at_zero() -> Result<()> {
    let mission = load()?;
    let weather = mission.weather();
    weather.set_cloud_density(9)?;
    weather.set_temperature(-3)?;
    weather.set_precipitations(4)?;

    weather.set_temperature(0)?;
    assert_eq!(weather.precipitations()?, 2);
    assert!(matches!(weather.set_precipitations(3), Err(Error::Validation(_))));
    weather.set_precipitations(1)?;
    Ok(())
}
