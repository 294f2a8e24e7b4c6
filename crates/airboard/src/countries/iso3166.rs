//! ISO 3166-1 country table.
//!
//! Ordered by alpha-2 code. Entries carry the short name, the official long-form
//! name where one exists, and a common name where the short name is a
//! "Surname, Given" style listing.

use super::registry::Country;

#[rustfmt::skip]
pub(super) const COUNTRIES: &[Country] = &[
    Country::new("AD", "AND", "020", "Andorra", Some("Principality of Andorra"), None),
    Country::new("AE", "ARE", "784", "United Arab Emirates", None, None),
    Country::new("AF", "AFG", "004", "Afghanistan", Some("Islamic Republic of Afghanistan"), None),
    Country::new("AG", "ATG", "028", "Antigua and Barbuda", None, None),
    Country::new("AI", "AIA", "660", "Anguilla", None, None),
    Country::new("AL", "ALB", "008", "Albania", Some("Republic of Albania"), None),
    Country::new("AM", "ARM", "051", "Armenia", Some("Republic of Armenia"), None),
    Country::new("AO", "AGO", "024", "Angola", Some("Republic of Angola"), None),
    Country::new("AQ", "ATA", "010", "Antarctica", None, None),
    Country::new("AR", "ARG", "032", "Argentina", Some("Argentine Republic"), None),
    Country::new("AS", "ASM", "016", "American Samoa", None, None),
    Country::new("AT", "AUT", "040", "Austria", Some("Republic of Austria"), None),
    Country::new("AU", "AUS", "036", "Australia", None, None),
    Country::new("AW", "ABW", "533", "Aruba", None, None),
    Country::new("AX", "ALA", "248", "Åland Islands", None, None),
    Country::new("AZ", "AZE", "031", "Azerbaijan", Some("Republic of Azerbaijan"), None),
    Country::new("BA", "BIH", "070", "Bosnia and Herzegovina", Some("Republic of Bosnia and Herzegovina"), None),
    Country::new("BB", "BRB", "052", "Barbados", None, None),
    Country::new("BD", "BGD", "050", "Bangladesh", Some("People's Republic of Bangladesh"), None),
    Country::new("BE", "BEL", "056", "Belgium", Some("Kingdom of Belgium"), None),
    Country::new("BF", "BFA", "854", "Burkina Faso", None, None),
    Country::new("BG", "BGR", "100", "Bulgaria", Some("Republic of Bulgaria"), None),
    Country::new("BH", "BHR", "048", "Bahrain", Some("Kingdom of Bahrain"), None),
    Country::new("BI", "BDI", "108", "Burundi", Some("Republic of Burundi"), None),
    Country::new("BJ", "BEN", "204", "Benin", Some("Republic of Benin"), None),
    Country::new("BL", "BLM", "652", "Saint Barthélemy", None, None),
    Country::new("BM", "BMU", "060", "Bermuda", None, None),
    Country::new("BN", "BRN", "096", "Brunei Darussalam", None, None),
    Country::new("BO", "BOL", "068", "Bolivia, Plurinational State of", Some("Plurinational State of Bolivia"), Some("Bolivia")),
    Country::new("BQ", "BES", "535", "Bonaire, Sint Eustatius and Saba", Some("Bonaire, Sint Eustatius and Saba"), None),
    Country::new("BR", "BRA", "076", "Brazil", Some("Federative Republic of Brazil"), None),
    Country::new("BS", "BHS", "044", "Bahamas", Some("Commonwealth of the Bahamas"), None),
    Country::new("BT", "BTN", "064", "Bhutan", Some("Kingdom of Bhutan"), None),
    Country::new("BV", "BVT", "074", "Bouvet Island", None, None),
    Country::new("BW", "BWA", "072", "Botswana", Some("Republic of Botswana"), None),
    Country::new("BY", "BLR", "112", "Belarus", Some("Republic of Belarus"), None),
    Country::new("BZ", "BLZ", "084", "Belize", None, None),
    Country::new("CA", "CAN", "124", "Canada", None, None),
    Country::new("CC", "CCK", "166", "Cocos (Keeling) Islands", None, None),
    Country::new("CD", "COD", "180", "Congo, The Democratic Republic of the", None, None),
    Country::new("CF", "CAF", "140", "Central African Republic", None, None),
    Country::new("CG", "COG", "178", "Congo", Some("Republic of the Congo"), None),
    Country::new("CH", "CHE", "756", "Switzerland", Some("Swiss Confederation"), None),
    Country::new("CI", "CIV", "384", "Côte d'Ivoire", Some("Republic of Côte d'Ivoire"), None),
    Country::new("CK", "COK", "184", "Cook Islands", None, None),
    Country::new("CL", "CHL", "152", "Chile", Some("Republic of Chile"), None),
    Country::new("CM", "CMR", "120", "Cameroon", Some("Republic of Cameroon"), None),
    Country::new("CN", "CHN", "156", "China", Some("People's Republic of China"), None),
    Country::new("CO", "COL", "170", "Colombia", Some("Republic of Colombia"), None),
    Country::new("CR", "CRI", "188", "Costa Rica", Some("Republic of Costa Rica"), None),
    Country::new("CU", "CUB", "192", "Cuba", Some("Republic of Cuba"), None),
    Country::new("CV", "CPV", "132", "Cabo Verde", Some("Republic of Cabo Verde"), None),
    Country::new("CW", "CUW", "531", "Curaçao", Some("Curaçao"), None),
    Country::new("CX", "CXR", "162", "Christmas Island", None, None),
    Country::new("CY", "CYP", "196", "Cyprus", Some("Republic of Cyprus"), None),
    Country::new("CZ", "CZE", "203", "Czechia", Some("Czech Republic"), None),
    Country::new("DE", "DEU", "276", "Germany", Some("Federal Republic of Germany"), None),
    Country::new("DJ", "DJI", "262", "Djibouti", Some("Republic of Djibouti"), None),
    Country::new("DK", "DNK", "208", "Denmark", Some("Kingdom of Denmark"), None),
    Country::new("DM", "DMA", "212", "Dominica", Some("Commonwealth of Dominica"), None),
    Country::new("DO", "DOM", "214", "Dominican Republic", None, None),
    Country::new("DZ", "DZA", "012", "Algeria", Some("People's Democratic Republic of Algeria"), None),
    Country::new("EC", "ECU", "218", "Ecuador", Some("Republic of Ecuador"), None),
    Country::new("EE", "EST", "233", "Estonia", Some("Republic of Estonia"), None),
    Country::new("EG", "EGY", "818", "Egypt", Some("Arab Republic of Egypt"), None),
    Country::new("EH", "ESH", "732", "Western Sahara", None, None),
    Country::new("ER", "ERI", "232", "Eritrea", Some("the State of Eritrea"), None),
    Country::new("ES", "ESP", "724", "Spain", Some("Kingdom of Spain"), None),
    Country::new("ET", "ETH", "231", "Ethiopia", Some("Federal Democratic Republic of Ethiopia"), None),
    Country::new("FI", "FIN", "246", "Finland", Some("Republic of Finland"), None),
    Country::new("FJ", "FJI", "242", "Fiji", Some("Republic of Fiji"), None),
    Country::new("FK", "FLK", "238", "Falkland Islands (Malvinas)", None, None),
    Country::new("FM", "FSM", "583", "Micronesia, Federated States of", Some("Federated States of Micronesia"), None),
    Country::new("FO", "FRO", "234", "Faroe Islands", None, None),
    Country::new("FR", "FRA", "250", "France", Some("French Republic"), None),
    Country::new("GA", "GAB", "266", "Gabon", Some("Gabonese Republic"), None),
    Country::new("GB", "GBR", "826", "United Kingdom", Some("United Kingdom of Great Britain and Northern Ireland"), None),
    Country::new("GD", "GRD", "308", "Grenada", None, None),
    Country::new("GE", "GEO", "268", "Georgia", None, None),
    Country::new("GF", "GUF", "254", "French Guiana", None, None),
    Country::new("GG", "GGY", "831", "Guernsey", None, None),
    Country::new("GH", "GHA", "288", "Ghana", Some("Republic of Ghana"), None),
    Country::new("GI", "GIB", "292", "Gibraltar", None, None),
    Country::new("GL", "GRL", "304", "Greenland", None, None),
    Country::new("GM", "GMB", "270", "Gambia", Some("Republic of the Gambia"), None),
    Country::new("GN", "GIN", "324", "Guinea", Some("Republic of Guinea"), None),
    Country::new("GP", "GLP", "312", "Guadeloupe", None, None),
    Country::new("GQ", "GNQ", "226", "Equatorial Guinea", Some("Republic of Equatorial Guinea"), None),
    Country::new("GR", "GRC", "300", "Greece", Some("Hellenic Republic"), None),
    Country::new("GS", "SGS", "239", "South Georgia and the South Sandwich Islands", None, None),
    Country::new("GT", "GTM", "320", "Guatemala", Some("Republic of Guatemala"), None),
    Country::new("GU", "GUM", "316", "Guam", None, None),
    Country::new("GW", "GNB", "624", "Guinea-Bissau", Some("Republic of Guinea-Bissau"), None),
    Country::new("GY", "GUY", "328", "Guyana", Some("Republic of Guyana"), None),
    Country::new("HK", "HKG", "344", "Hong Kong", Some("Hong Kong Special Administrative Region of China"), None),
    Country::new("HM", "HMD", "334", "Heard Island and McDonald Islands", None, None),
    Country::new("HN", "HND", "340", "Honduras", Some("Republic of Honduras"), None),
    Country::new("HR", "HRV", "191", "Croatia", Some("Republic of Croatia"), None),
    Country::new("HT", "HTI", "332", "Haiti", Some("Republic of Haiti"), None),
    Country::new("HU", "HUN", "348", "Hungary", None, None),
    Country::new("ID", "IDN", "360", "Indonesia", Some("Republic of Indonesia"), None),
    Country::new("IE", "IRL", "372", "Ireland", None, None),
    Country::new("IL", "ISR", "376", "Israel", Some("State of Israel"), None),
    Country::new("IM", "IMN", "833", "Isle of Man", None, None),
    Country::new("IN", "IND", "356", "India", Some("Republic of India"), None),
    Country::new("IO", "IOT", "086", "British Indian Ocean Territory", None, None),
    Country::new("IQ", "IRQ", "368", "Iraq", Some("Republic of Iraq"), None),
    Country::new("IR", "IRN", "364", "Iran, Islamic Republic of", Some("Islamic Republic of Iran"), Some("Iran")),
    Country::new("IS", "ISL", "352", "Iceland", Some("Republic of Iceland"), None),
    Country::new("IT", "ITA", "380", "Italy", Some("Italian Republic"), None),
    Country::new("JE", "JEY", "832", "Jersey", None, None),
    Country::new("JM", "JAM", "388", "Jamaica", None, None),
    Country::new("JO", "JOR", "400", "Jordan", Some("Hashemite Kingdom of Jordan"), None),
    Country::new("JP", "JPN", "392", "Japan", None, None),
    Country::new("KE", "KEN", "404", "Kenya", Some("Republic of Kenya"), None),
    Country::new("KG", "KGZ", "417", "Kyrgyzstan", Some("Kyrgyz Republic"), None),
    Country::new("KH", "KHM", "116", "Cambodia", Some("Kingdom of Cambodia"), None),
    Country::new("KI", "KIR", "296", "Kiribati", Some("Republic of Kiribati"), None),
    Country::new("KM", "COM", "174", "Comoros", Some("Union of the Comoros"), None),
    Country::new("KN", "KNA", "659", "Saint Kitts and Nevis", None, None),
    Country::new("KP", "PRK", "408", "Korea, Democratic People's Republic of", Some("Democratic People's Republic of Korea"), Some("North Korea")),
    Country::new("KR", "KOR", "410", "Korea, Republic of", None, Some("South Korea")),
    Country::new("KW", "KWT", "414", "Kuwait", Some("State of Kuwait"), None),
    Country::new("KY", "CYM", "136", "Cayman Islands", None, None),
    Country::new("KZ", "KAZ", "398", "Kazakhstan", Some("Republic of Kazakhstan"), None),
    Country::new("LA", "LAO", "418", "Lao People's Democratic Republic", None, Some("Laos")),
    Country::new("LB", "LBN", "422", "Lebanon", Some("Lebanese Republic"), None),
    Country::new("LC", "LCA", "662", "Saint Lucia", None, None),
    Country::new("LI", "LIE", "438", "Liechtenstein", Some("Principality of Liechtenstein"), None),
    Country::new("LK", "LKA", "144", "Sri Lanka", Some("Democratic Socialist Republic of Sri Lanka"), None),
    Country::new("LR", "LBR", "430", "Liberia", Some("Republic of Liberia"), None),
    Country::new("LS", "LSO", "426", "Lesotho", Some("Kingdom of Lesotho"), None),
    Country::new("LT", "LTU", "440", "Lithuania", Some("Republic of Lithuania"), None),
    Country::new("LU", "LUX", "442", "Luxembourg", Some("Grand Duchy of Luxembourg"), None),
    Country::new("LV", "LVA", "428", "Latvia", Some("Republic of Latvia"), None),
    Country::new("LY", "LBY", "434", "Libya", None, None),
    Country::new("MA", "MAR", "504", "Morocco", Some("Kingdom of Morocco"), None),
    Country::new("MC", "MCO", "492", "Monaco", Some("Principality of Monaco"), None),
    Country::new("MD", "MDA", "498", "Moldova, Republic of", Some("Republic of Moldova"), Some("Moldova")),
    Country::new("ME", "MNE", "499", "Montenegro", None, None),
    Country::new("MF", "MAF", "663", "Saint Martin (French part)", None, None),
    Country::new("MG", "MDG", "450", "Madagascar", Some("Republic of Madagascar"), None),
    Country::new("MH", "MHL", "584", "Marshall Islands", Some("Republic of the Marshall Islands"), None),
    Country::new("MK", "MKD", "807", "North Macedonia", Some("Republic of North Macedonia"), None),
    Country::new("ML", "MLI", "466", "Mali", Some("Republic of Mali"), None),
    Country::new("MM", "MMR", "104", "Myanmar", Some("Republic of Myanmar"), None),
    Country::new("MN", "MNG", "496", "Mongolia", None, None),
    Country::new("MO", "MAC", "446", "Macao", Some("Macao Special Administrative Region of China"), None),
    Country::new("MP", "MNP", "580", "Northern Mariana Islands", Some("Commonwealth of the Northern Mariana Islands"), None),
    Country::new("MQ", "MTQ", "474", "Martinique", None, None),
    Country::new("MR", "MRT", "478", "Mauritania", Some("Islamic Republic of Mauritania"), None),
    Country::new("MS", "MSR", "500", "Montserrat", None, None),
    Country::new("MT", "MLT", "470", "Malta", Some("Republic of Malta"), None),
    Country::new("MU", "MUS", "480", "Mauritius", Some("Republic of Mauritius"), None),
    Country::new("MV", "MDV", "462", "Maldives", Some("Republic of Maldives"), None),
    Country::new("MW", "MWI", "454", "Malawi", Some("Republic of Malawi"), None),
    Country::new("MX", "MEX", "484", "Mexico", Some("United Mexican States"), None),
    Country::new("MY", "MYS", "458", "Malaysia", None, None),
    Country::new("MZ", "MOZ", "508", "Mozambique", Some("Republic of Mozambique"), None),
    Country::new("NA", "NAM", "516", "Namibia", Some("Republic of Namibia"), None),
    Country::new("NC", "NCL", "540", "New Caledonia", None, None),
    Country::new("NE", "NER", "562", "Niger", Some("Republic of the Niger"), None),
    Country::new("NF", "NFK", "574", "Norfolk Island", None, None),
    Country::new("NG", "NGA", "566", "Nigeria", Some("Federal Republic of Nigeria"), None),
    Country::new("NI", "NIC", "558", "Nicaragua", Some("Republic of Nicaragua"), None),
    Country::new("NL", "NLD", "528", "Netherlands", Some("Kingdom of the Netherlands"), None),
    Country::new("NO", "NOR", "578", "Norway", Some("Kingdom of Norway"), None),
    Country::new("NP", "NPL", "524", "Nepal", Some("Federal Democratic Republic of Nepal"), None),
    Country::new("NR", "NRU", "520", "Nauru", Some("Republic of Nauru"), None),
    Country::new("NU", "NIU", "570", "Niue", None, None),
    Country::new("NZ", "NZL", "554", "New Zealand", None, None),
    Country::new("OM", "OMN", "512", "Oman", Some("Sultanate of Oman"), None),
    Country::new("PA", "PAN", "591", "Panama", Some("Republic of Panama"), None),
    Country::new("PE", "PER", "604", "Peru", Some("Republic of Peru"), None),
    Country::new("PF", "PYF", "258", "French Polynesia", None, None),
    Country::new("PG", "PNG", "598", "Papua New Guinea", Some("Independent State of Papua New Guinea"), None),
    Country::new("PH", "PHL", "608", "Philippines", Some("Republic of the Philippines"), None),
    Country::new("PK", "PAK", "586", "Pakistan", Some("Islamic Republic of Pakistan"), None),
    Country::new("PL", "POL", "616", "Poland", Some("Republic of Poland"), None),
    Country::new("PM", "SPM", "666", "Saint Pierre and Miquelon", None, None),
    Country::new("PN", "PCN", "612", "Pitcairn", None, None),
    Country::new("PR", "PRI", "630", "Puerto Rico", None, None),
    Country::new("PS", "PSE", "275", "Palestine, State of", Some("the State of Palestine"), None),
    Country::new("PT", "PRT", "620", "Portugal", Some("Portuguese Republic"), None),
    Country::new("PW", "PLW", "585", "Palau", Some("Republic of Palau"), None),
    Country::new("PY", "PRY", "600", "Paraguay", Some("Republic of Paraguay"), None),
    Country::new("QA", "QAT", "634", "Qatar", Some("State of Qatar"), None),
    Country::new("RE", "REU", "638", "Réunion", None, None),
    Country::new("RO", "ROU", "642", "Romania", None, None),
    Country::new("RS", "SRB", "688", "Serbia", Some("Republic of Serbia"), None),
    Country::new("RU", "RUS", "643", "Russian Federation", None, None),
    Country::new("RW", "RWA", "646", "Rwanda", Some("Rwandese Republic"), None),
    Country::new("SA", "SAU", "682", "Saudi Arabia", Some("Kingdom of Saudi Arabia"), None),
    Country::new("SB", "SLB", "090", "Solomon Islands", None, None),
    Country::new("SC", "SYC", "690", "Seychelles", Some("Republic of Seychelles"), None),
    Country::new("SD", "SDN", "729", "Sudan", Some("Republic of the Sudan"), None),
    Country::new("SE", "SWE", "752", "Sweden", Some("Kingdom of Sweden"), None),
    Country::new("SG", "SGP", "702", "Singapore", Some("Republic of Singapore"), None),
    Country::new("SH", "SHN", "654", "Saint Helena, Ascension and Tristan da Cunha", None, None),
    Country::new("SI", "SVN", "705", "Slovenia", Some("Republic of Slovenia"), None),
    Country::new("SJ", "SJM", "744", "Svalbard and Jan Mayen", None, None),
    Country::new("SK", "SVK", "703", "Slovakia", Some("Slovak Republic"), None),
    Country::new("SL", "SLE", "694", "Sierra Leone", Some("Republic of Sierra Leone"), None),
    Country::new("SM", "SMR", "674", "San Marino", Some("Republic of San Marino"), None),
    Country::new("SN", "SEN", "686", "Senegal", Some("Republic of Senegal"), None),
    Country::new("SO", "SOM", "706", "Somalia", Some("Federal Republic of Somalia"), None),
    Country::new("SR", "SUR", "740", "Suriname", Some("Republic of Suriname"), None),
    Country::new("SS", "SSD", "728", "South Sudan", Some("Republic of South Sudan"), None),
    Country::new("ST", "STP", "678", "Sao Tome and Principe", Some("Democratic Republic of Sao Tome and Principe"), None),
    Country::new("SV", "SLV", "222", "El Salvador", Some("Republic of El Salvador"), None),
    Country::new("SX", "SXM", "534", "Sint Maarten (Dutch part)", Some("Sint Maarten (Dutch part)"), None),
    Country::new("SY", "SYR", "760", "Syrian Arab Republic", None, Some("Syria")),
    Country::new("SZ", "SWZ", "748", "Eswatini", Some("Kingdom of Eswatini"), None),
    Country::new("TC", "TCA", "796", "Turks and Caicos Islands", None, None),
    Country::new("TD", "TCD", "148", "Chad", Some("Republic of Chad"), None),
    Country::new("TF", "ATF", "260", "French Southern Territories", None, None),
    Country::new("TG", "TGO", "768", "Togo", Some("Togolese Republic"), None),
    Country::new("TH", "THA", "764", "Thailand", Some("Kingdom of Thailand"), None),
    Country::new("TJ", "TJK", "762", "Tajikistan", Some("Republic of Tajikistan"), None),
    Country::new("TK", "TKL", "772", "Tokelau", None, None),
    Country::new("TL", "TLS", "626", "Timor-Leste", Some("Democratic Republic of Timor-Leste"), None),
    Country::new("TM", "TKM", "795", "Turkmenistan", None, None),
    Country::new("TN", "TUN", "788", "Tunisia", Some("Republic of Tunisia"), None),
    Country::new("TO", "TON", "776", "Tonga", Some("Kingdom of Tonga"), None),
    Country::new("TR", "TUR", "792", "Türkiye", Some("Republic of Türkiye"), None),
    Country::new("TT", "TTO", "780", "Trinidad and Tobago", Some("Republic of Trinidad and Tobago"), None),
    Country::new("TV", "TUV", "798", "Tuvalu", None, None),
    Country::new("TW", "TWN", "158", "Taiwan, Province of China", Some("Taiwan, Province of China"), Some("Taiwan")),
    Country::new("TZ", "TZA", "834", "Tanzania, United Republic of", Some("United Republic of Tanzania"), Some("Tanzania")),
    Country::new("UA", "UKR", "804", "Ukraine", None, None),
    Country::new("UG", "UGA", "800", "Uganda", Some("Republic of Uganda"), None),
    Country::new("UM", "UMI", "581", "United States Minor Outlying Islands", None, None),
    Country::new("US", "USA", "840", "United States", Some("United States of America"), None),
    Country::new("UY", "URY", "858", "Uruguay", Some("Eastern Republic of Uruguay"), None),
    Country::new("UZ", "UZB", "860", "Uzbekistan", Some("Republic of Uzbekistan"), None),
    Country::new("VA", "VAT", "336", "Holy See (Vatican City State)", None, None),
    Country::new("VC", "VCT", "670", "Saint Vincent and the Grenadines", None, None),
    Country::new("VE", "VEN", "862", "Venezuela, Bolivarian Republic of", Some("Bolivarian Republic of Venezuela"), Some("Venezuela")),
    Country::new("VG", "VGB", "092", "Virgin Islands, British", Some("British Virgin Islands"), None),
    Country::new("VI", "VIR", "850", "Virgin Islands, U.S.", Some("Virgin Islands of the United States"), None),
    Country::new("VN", "VNM", "704", "Viet Nam", Some("Socialist Republic of Viet Nam"), Some("Vietnam")),
    Country::new("VU", "VUT", "548", "Vanuatu", Some("Republic of Vanuatu"), None),
    Country::new("WF", "WLF", "876", "Wallis and Futuna", None, None),
    Country::new("WS", "WSM", "882", "Samoa", Some("Independent State of Samoa"), None),
    Country::new("YE", "YEM", "887", "Yemen", Some("Republic of Yemen"), None),
    Country::new("YT", "MYT", "175", "Mayotte", None, None),
    Country::new("ZA", "ZAF", "710", "South Africa", Some("Republic of South Africa"), None),
    Country::new("ZM", "ZMB", "894", "Zambia", Some("Republic of Zambia"), None),
    Country::new("ZW", "ZWE", "716", "Zimbabwe", Some("Republic of Zimbabwe"), None),
];
