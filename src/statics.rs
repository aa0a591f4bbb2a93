// Central place for archive layout, mission table keys and other fixed strings.
// Keep these out of the model modules to reduce duplication and make tweaks safer.

// Archive members
pub const MEMBER_MISSION: &str = "mission";
pub const MEMBER_OPTIONS: &str = "options";
pub const MEMBER_WAREHOUSES: &str = "warehouses";
pub const MEMBER_DICTIONARY: &str = "l10n/DEFAULT/dictionary";
pub const MEMBER_MAP_RESOURCE: &str = "l10n/DEFAULT/mapResource";

pub const REQUIRED_MEMBERS: [&str; 5] = [
    MEMBER_MISSION,
    MEMBER_OPTIONS,
    MEMBER_WAREHOUSES,
    MEMBER_DICTIONARY,
    MEMBER_MAP_RESOURCE,
];

pub const MIZ_EXTENSION: &str = "miz";
pub const SCRATCH_PREFIX: &str = "mizkit_";
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_edited";

// Root assignment names of the three Lua members
pub const QUAL_MISSION: &str = "mission";
pub const QUAL_DICTIONARY: &str = "dictionary";
pub const QUAL_MAP_RESOURCE: &str = "mapResource";

// Progress labels
pub const EN_PROGRESS_DECODE: &str = "Decoding MIZ file";
pub const EN_PROGRESS_ENCODE: &str = "Encoding MIZ file";
pub const EN_LABEL_MAP_RESOURCE: &str = "map resource";
pub const EN_LABEL_DICTIONARY: &str = "dictionary";
pub const EN_LABEL_MISSION: &str = "mission";

// Mission root
pub const KEY_START_TIME: &str = "start_time";
pub const KEY_SORTIE: &str = "sortie";
pub const KEY_THEATRE: &str = "theatre";
pub const KEY_DESCRIPTION_TEXT: &str = "descriptionText";
pub const KEY_DESCRIPTION_BLUE: &str = "descriptionBlueTask";
pub const KEY_DESCRIPTION_RED: &str = "descriptionRedTask";
pub const KEY_WEATHER: &str = "weather";
pub const KEY_GROUND_CONTROL: &str = "groundControl";
pub const KEY_COALITION: &str = "coalition";

pub const START_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// Coalitions and countries
pub const KEY_COUNTRY: &str = "country";
pub const KEY_NAME: &str = "name";
pub const KEY_ID: &str = "id";
pub const KEY_BULLSEYE: &str = "bullseye";
pub const KEY_GROUP: &str = "group";

// Groups
pub const KEY_GROUP_ID: &str = "groupId";
pub const KEY_HIDDEN: &str = "hidden";
pub const KEY_LATE_ACTIVATION: &str = "lateActivation";
pub const KEY_UNCONTROLLED: &str = "uncontrolled";
pub const KEY_FREQUENCY: &str = "frequency";
pub const KEY_TASK: &str = "task";
pub const KEY_UNITS: &str = "units";
pub const KEY_X: &str = "x";
pub const KEY_Y: &str = "y";

// Units
pub const KEY_UNIT_ID: &str = "unitId";
pub const KEY_TYPE: &str = "type";
pub const KEY_SKILL: &str = "skill";
pub const KEY_HEADING: &str = "heading";
pub const KEY_LIVERY: &str = "livery_id";
pub const KEY_ONBOARD_NUM: &str = "onboard_num";
pub const KEY_PARKING: &str = "parking";
pub const KEY_PARKING_ID: &str = "parking_id";
pub const KEY_ALT: &str = "alt";
pub const KEY_SPEED: &str = "speed";
pub const KEY_RADIO: &str = "Radio";
pub const KEY_CHANNELS: &str = "channels";

pub const SKILL_CLIENT: &str = "Client";
pub const SKILLS: [&str; 7] = [
    "Average",
    "Good",
    "High",
    "Excellent",
    "Random",
    SKILL_CLIENT,
    "Player",
];

// Weather
pub const KEY_ATMOSPHERE_TYPE: &str = "atmosphere_type";
pub const KEY_CLOUDS: &str = "clouds";
pub const KEY_CLOUD_DENSITY: &str = "density";
pub const KEY_CLOUD_BASE: &str = "base";
pub const KEY_CLOUD_THICKNESS: &str = "thickness";
pub const KEY_PRECIPITATIONS: &str = "iprecptns";
pub const KEY_SEASON: &str = "season";
pub const KEY_TEMPERATURE: &str = "temperature";
pub const KEY_GROUND_TURBULENCE: &str = "groundTurbulence";
pub const KEY_QNH: &str = "qnh";
pub const KEY_VISIBILITY: &str = "visibility";
pub const KEY_DISTANCE: &str = "distance";
pub const KEY_WIND: &str = "wind";
pub const KEY_WIND_SPEED: &str = "speed";
pub const KEY_WIND_DIR: &str = "dir";
pub const KEY_ENABLE_FOG: &str = "enable_fog";
pub const KEY_FOG: &str = "fog";
pub const KEY_FOG_THICKNESS: &str = "thickness";
pub const KEY_FOG_VISIBILITY: &str = "visibility";
pub const KEY_ENABLE_DUST: &str = "enable_dust";
pub const KEY_DUST_DENSITY: &str = "dust_density";

// Ground control
pub const KEY_PILOT_CONTROL_VEHICLES: &str = "isPilotControlVehicles";
pub const KEY_ROLES: &str = "roles";
