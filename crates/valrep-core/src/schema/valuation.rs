//! Built-in valuation report form: template and binding table.
//!
//! Keywords are the labels printed on the form, plus a few spellings the OCR
//! is known to produce for them (e.g. "Renu'r" for "Ground Rent").

use serde_json::{Map, Value};

use super::binding::FieldBinding;
use super::SchemaTemplate;

pub const FINANCE_SECTION: &str = "valuationForFinancePurpose";
pub const HPP_SECTION: &str = "valuationForFinancePurposeHPP";
pub const FULL_TEXT_PATH: &str = "extractedText";

/// Default-valued record of the valuation report form.
///
/// Boolean fields default to `false`, every other field to `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationReportTemplate;

impl SchemaTemplate for ValuationReportTemplate {
    fn default_record(&self) -> Value {
        let mut root = Map::new();
        for key in [
            "applicationType",
            "applicationNumber",
            "applicantName",
            "dateOfInspection",
            "propertyAddress",
            "postCode",
            "generalRemarks",
        ] {
            root.insert(key.to_string(), Value::Null);
        }

        root.insert(
            "propertyType".into(),
            section(
                &[
                    "isDetachedHouse",
                    "isSemiDetachedHouse",
                    "isTerracedHouse",
                    "isBungalow",
                    "isFlat",
                    "isMaisonette",
                    "isBuiltOrOwnedByLocalAuthority",
                    "isFlatMaisonetteConverted",
                    "isPurposeBuilt",
                    "isAboveCommercial",
                    "isFlyingFreehold",
                    "isPartCommercialUse",
                    "isPurchasedUnderSharedOwnership",
                ],
                &[
                    "flatMaisonetteFloor",
                    "numberOfFloorsInBlock",
                    "ownerOccupationPercentage",
                    "conversionYear",
                    "numberOfUnitsInBlock",
                    "residentialNatureImpact",
                    "tenure",
                    "flyingFreeholdPercentage",
                    "maintenanceCharge",
                    "roadCharges",
                    "groundRent",
                    "remainingLeaseTermYears",
                    "commercialUsePercentage",
                    "yearBuilt",
                ],
            ),
        );

        root.insert(
            "accommodation".into(),
            section(
                &["isLiftPresent", "gardens", "isPrivate", "isCommunal"],
                &[
                    "hall",
                    "livingRooms",
                    "kitchen",
                    "utility",
                    "bedrooms",
                    "bathrooms",
                    "separateWc",
                    "basement",
                    "garage",
                    "parking",
                    "numberOfOutbuildings",
                    "outbuildingDetails",
                    "grossFloorAreaOfDwelling",
                ],
            ),
        );

        root.insert(
            "currentOccupency".into(),
            section(
                &[
                    "isEverOccupied",
                    "isHmoOrMultiUnitFreeholdBlock",
                    "isCurrentlyTenanted",
                ],
                &["numberOfAdultsInProperty", "hmoOrMultiUnitDetails"],
            ),
        );

        root.insert(
            "newBuild".into(),
            section(
                &[
                    "isNewBuildOrRecentlyConverted",
                    "isCompleted",
                    "isUnderConstruction",
                    "isFinalInspectionRequired",
                    "isNhbcCert",
                    "isBuildZone",
                    "isPremier",
                    "isProfessionalConsultant",
                    "isOtherCert",
                    "isSelfBuildProject",
                    "isInvolvesPartExchange",
                    "isDisclosureOfIncentivesSeen",
                ],
                &["otherCertDetails", "incentivesDetails", "newBuildDeveloperName"],
            ),
        );

        root.insert(
            "construction".into(),
            section(
                &[
                    "isStandardConstruction",
                    "nonStandardConstructionType",
                    "isHasAlterationsOrExtensions",
                    "isAlterationsRequireConsents",
                ],
                &[
                    "mainWalls",
                    "mainRoof",
                    "garageConstruction",
                    "outbuildingsConstruction",
                    "alterationsAge",
                ],
            ),
        );

        root.insert(
            "localityAndDemand".into(),
            section(
                &[
                    "isUrban",
                    "isSuburban",
                    "isRural",
                    "isGoodMarketAppeal",
                    "isAverageMarketAppeal",
                    "isPoorMarketAppeal",
                    "isOwnerResidential",
                    "isResidentialLet",
                    "isCommercial",
                    "isPricesRising",
                    "isPricesStatic",
                    "isPricesFalling",
                    "isDemandRising",
                    "isDemandStatic",
                    "isDemandFalling",
                    "isAffectedByCompulsoryPurchase",
                    "isVacantOrBoardedPropertiesNearby",
                    "isOccupancyRestrictionPossible",
                    "isCloseToHighVoltageEquipment",
                ],
                &[
                    "compulsoryPurchaseDetails",
                    "vacantOrBoardedDetails",
                    "occupancyRestrictionDetails",
                    "highVoltageEquipmentDetails",
                ],
            ),
        );

        root.insert(
            "services".into(),
            section(
                &[
                    "isMainsWater",
                    "isPrivateWater",
                    "isUnknownWater",
                    "isGasSupply",
                    "isElectricitySupply",
                    "isCentralHeating",
                    "isMainDrainage",
                    "isSepticTankPlant",
                    "isUnknownDrainage",
                    "isSolarPanels",
                    "isSharedAccess",
                    "isRoadAdopted",
                    "isHasEasementsOrRightsOfWay",
                ],
                &["centralHeatingType", "easementsOrRightsDetails"],
            ),
        );

        root.insert(
            "energyEfficiency".into(),
            section(&[], &["epcRating", "epcScore"]),
        );

        let mut conditions = section(
            &[
                "isStructuralMovement",
                "isStructuralMovementHistoricOrNonProgressive",
                "isStructuralModifications",
                "communalAreasMaintained",
                "isPlotBoundariesDefinedUnderPointFourHectares",
                "isTreesWithinInfluencingDistance",
                "isBuiltOnSteepSlope",
            ],
            &["structuralMovementDetails", "structuralModificationsDetails"],
        );
        nest(
            &mut conditions,
            "propertyProneTo",
            section(&["flooding", "subsidence", "heave", "landslip"], &["details"]),
        );
        root.insert("conditionsOfProperty".into(), conditions);

        root.insert(
            "reports".into(),
            section(
                &[
                    "isTimberDamp",
                    "isMining",
                    "isElectrical",
                    "isDrains",
                    "isStructuralEngineers",
                    "isArboricultural",
                    "isMundic",
                    "isWallTies",
                    "isRoof",
                    "isMetalliferous",
                ],
                &[],
            ),
        );

        root.insert(
            "rentalInformation".into(),
            section(
                &[
                    "isRentalDemandInLocality",
                    "isOtherLettingDemandFactors",
                    "investorOnlyDemand",
                ],
                &[
                    "monthlyMarketRentPresentCondition",
                    "monthlyMarketRentImprovedCondition",
                ],
            ),
        );

        let finance = section(
            &["isSuitableForFinance"],
            &[
                "marketValuePresentCondition",
                "marketValueAfterRepairs",
                "purchasePriceOrBorrowerEstimate",
                "buildingInsuranceReinstatementCost",
            ],
        );
        root.insert(FINANCE_SECTION.into(), finance.clone());
        root.insert(HPP_SECTION.into(), finance);

        let mut declaration = section(
            &[],
            &[
                "valuerName",
                "onBehalfOf",
                "telephone",
                "email",
                "ricsNumber",
                "valuerAddress",
                "valuerPostcode",
                "reportDate",
            ],
        );
        nest(
            &mut declaration,
            "valuerQualifications",
            section(&["mrics", "frics", "assocRics"], &[]),
        );
        root.insert("valuersDeclaration".into(), declaration);

        root.insert(FULL_TEXT_PATH.into(), Value::String(String::new()));

        Value::Object(root)
    }
}

fn section(flags: &[&str], values: &[&str]) -> Value {
    let mut map = Map::new();
    for flag in flags {
        map.insert(flag.to_string(), Value::Bool(false));
    }
    for value in values {
        map.insert(value.to_string(), Value::Null);
    }
    Value::Object(map)
}

fn nest(parent: &mut Value, key: &str, child: Value) {
    if let Value::Object(map) = parent {
        map.insert(key.to_string(), child);
    }
}

const PROPERTY_TYPE_FLAGS: &[(&str, &[&str])] = &[
    ("isDetachedHouse", &["Detached House"]),
    ("isSemiDetachedHouse", &["Semi-Detached"]),
    ("isTerracedHouse", &["Terraced House"]),
    ("isBungalow", &["Bungalow"]),
    ("isFlat", &["Flat"]),
    ("isMaisonette", &["Maisonette"]),
    ("isBuiltOrOwnedByLocalAuthority", &["Local Authority"]),
    ("isFlatMaisonetteConverted", &["Converted"]),
    ("isPurposeBuilt", &["Purpose Built"]),
    ("isAboveCommercial", &["Above commercial"]),
    ("isFlyingFreehold", &["Flying freehold"]),
    ("isPartCommercialUse", &["commercial use"]),
    ("isPurchasedUnderSharedOwnership", &["Shared Ownership"]),
];

const NEW_BUILD_FLAGS: &[(&str, &[&str])] = &[
    ("isNewBuildOrRecentlyConverted", &["New Build"]),
    ("isCompleted", &["Completed"]),
    ("isUnderConstruction", &["Under Construction"]),
    ("isFinalInspectionRequired", &["Final inspection required"]),
    ("isNhbcCert", &["NHBC"]),
    ("isBuildZone", &["Buildzone"]),
    ("isPremier", &["Premier"]),
    ("isProfessionalConsultant", &["Professional Consultant"]),
    ("isOtherCert", &["Other Cert"]),
    ("isSelfBuildProject", &["Self-build"]),
    ("isInvolvesPartExchange", &["part exchange"]),
    ("isDisclosureOfIncentivesSeen", &["Disclosure of Incentives"]),
];

const CONSTRUCTION_FLAGS: &[(&str, &[&str])] = &[
    ("isStandardConstruction", &["Standard construction"]),
    ("nonStandardConstructionType", &["system or type"]),
    ("isHasAlterationsOrExtensions", &["alterations", "extensions"]),
    ("isAlterationsRequireConsents", &["require consents"]),
];

const LOCALITY_FLAGS: &[(&str, &[&str])] = &[
    ("isUrban", &["Urban"]),
    ("isSuburban", &["Suburban"]),
    ("isRural", &["Rural"]),
    ("isGoodMarketAppeal", &["Good"]),
    ("isAverageMarketAppeal", &["Average"]),
    ("isPoorMarketAppeal", &["Poor"]),
    ("isOwnerResidential", &["Owner residential"]),
    ("isResidentialLet", &["Residential let"]),
    ("isCommercial", &["Commercial"]),
    ("isPricesRising", &["Prices", "Rising"]),
    ("isPricesStatic", &["Prices", "Static"]),
    ("isPricesFalling", &["Prices", "Falling"]),
    ("isDemandRising", &["Demand", "Rising"]),
    ("isDemandStatic", &["Demand", "Static"]),
    ("isDemandFalling", &["Demand", "Falling"]),
    ("isAffectedByCompulsoryPurchase", &["Compulsory Purchase"]),
    ("isVacantOrBoardedPropertiesNearby", &["vacant or boarded"]),
    ("isOccupancyRestrictionPossible", &["Occupancy restriction"]),
    ("isCloseToHighVoltageEquipment", &["high voltage equipment"]),
];

const SERVICES_FLAGS: &[(&str, &[&str])] = &[
    ("isMainsWater", &["Mains"]),
    ("isPrivateWater", &["Private"]),
    ("isUnknownWater", &["Unknown"]),
    ("isGasSupply", &["Gas"]),
    ("isElectricitySupply", &["Electricity"]),
    ("isCentralHeating", &["Central Heating"]),
    ("isMainDrainage", &["Main drainage"]),
    ("isSepticTankPlant", &["Septic tank"]),
    ("isUnknownDrainage", &["Unknown drainage"]),
    ("isSolarPanels", &["Solar panels"]),
    ("isSharedAccess", &["Shared access"]),
    ("isRoadAdopted", &["Road adopted"]),
    ("isHasEasementsOrRightsOfWay", &["Easements", "Rights of Way"]),
];

/// Binding table for the valuation report form, in evaluation order.
pub fn valuation_report_bindings() -> Vec<FieldBinding> {
    let mut bindings = vec![
        FieldBinding::text("applicationType", &["VALUATION REPORT"]).on_page(0),
        FieldBinding::text("applicationNumber", &["Application Number"])
            .on_page(0)
            .digits_only(),
        FieldBinding::text("applicantName", &["Surname", "Initials"])
            .below()
            .on_page(0),
        FieldBinding::text("dateOfInspection", &["Date of Inspection"]).on_page(0),
        FieldBinding::multiline("propertyAddress", &["Property Address"]).on_page(0),
        FieldBinding::text("postCode", &["Postcode"]),
    ];

    let flag = |section: &str, key: &str, keywords: &[&str]| {
        FieldBinding::boolean(&format!("{section}.{key}"), keywords)
    };
    let path = |section: &str, key: &str| format!("{section}.{key}");

    // Property type
    for (key, keywords) in PROPERTY_TYPE_FLAGS {
        bindings.push(flag("propertyType", key, keywords));
    }
    let pt = |key: &str| path("propertyType", key);
    bindings.extend([
        FieldBinding::integer(&pt("flatMaisonetteFloor"), &["what floor"]),
        FieldBinding::integer(&pt("numberOfFloorsInBlock"), &["floors in block"]),
        FieldBinding::integer(&pt("ownerOccupationPercentage"), &["owner occupation"]).percent(),
        FieldBinding::integer(&pt("conversionYear"), &["year of conversion"]).year(),
        FieldBinding::integer(&pt("numberOfUnitsInBlock"), &["units in block"]),
        FieldBinding::text(&pt("residentialNatureImpact"), &["Noise", "Odour"]).below(),
        FieldBinding::text(&pt("tenure"), &["Tenure"]),
        FieldBinding::integer(&pt("flyingFreeholdPercentage"), &["flying freehold", "percentage"])
            .percent(),
        FieldBinding::currency(&pt("maintenanceCharge"), &["Maintenance Charge"]),
        FieldBinding::currency(&pt("roadCharges"), &["Road Charge", "Road Charge:"]),
        FieldBinding::currency(&pt("groundRent"), &["Ground Rent", "Renu'r"]),
        FieldBinding::integer(&pt("remainingLeaseTermYears"), &["Remaining term of Lease"]),
        FieldBinding::integer(&pt("commercialUsePercentage"), &["commercial use", "percentage"])
            .percent(),
        FieldBinding::integer(&pt("yearBuilt"), &["Year property built"]).year(),
    ]);

    // Accommodation
    for (key, keyword) in [
        ("hall", "Hall"),
        ("livingRooms", "Living Rooms"),
        ("kitchen", "Kitchen"),
        ("utility", "Utility"),
        ("bedrooms", "Bedrooms"),
        ("bathrooms", "Bathrooms"),
        ("separateWc", "Separate WC"),
        ("basement", "Basement"),
        ("garage", "Garage"),
        ("parking", "Parking"),
    ] {
        bindings.push(FieldBinding::integer(&path("accommodation", key), &[keyword]));
    }
    bindings.extend([
        flag("accommodation", "isLiftPresent", &["Lift"]),
        flag("accommodation", "gardens", &["Gardens"]),
        flag("accommodation", "isPrivate", &["Private"]),
        flag("accommodation", "isCommunal", &["Communal"]),
        FieldBinding::integer(&path("accommodation", "numberOfOutbuildings"), &["outbuildings"]),
        FieldBinding::text(&path("accommodation", "outbuildingDetails"), &["outbuilding details"]),
        FieldBinding::integer(
            &path("accommodation", "grossFloorAreaOfDwelling"),
            &["Gross floor area"],
        ),
    ]);

    // Current occupancy
    bindings.extend([
        flag("currentOccupency", "isEverOccupied", &["ever been occupied"]),
        FieldBinding::integer(
            &path("currentOccupency", "numberOfAdultsInProperty"),
            &["adults appear to live"],
        ),
        flag("currentOccupency", "isHmoOrMultiUnitFreeholdBlock", &["HMO/Multi Unit"]),
        flag("currentOccupency", "isCurrentlyTenanted", &["tenanted at present"]),
        FieldBinding::text(
            &path("currentOccupency", "hmoOrMultiUnitDetails"),
            &["HMO details", "Multi Unit details"],
        ),
    ]);

    // New build
    for (key, keywords) in NEW_BUILD_FLAGS {
        bindings.push(flag("newBuild", key, keywords));
    }
    bindings.extend([
        FieldBinding::text(&path("newBuild", "otherCertDetails"), &["Other X", "provide details"]),
        FieldBinding::text(
            &path("newBuild", "incentivesDetails"),
            &["Including total value of incentives"],
        ),
        FieldBinding::text(&path("newBuild", "newBuildDeveloperName"), &["Developer"]),
    ]);

    // Construction
    for (key, keywords) in CONSTRUCTION_FLAGS {
        bindings.push(flag("construction", key, keywords));
    }

    // Locality and demand
    for (key, keywords) in LOCALITY_FLAGS {
        bindings.push(flag("localityAndDemand", key, keywords));
    }

    // Services
    for (key, keywords) in SERVICES_FLAGS {
        bindings.push(flag("services", key, keywords));
    }

    bindings.extend([
        FieldBinding::text(&path("construction", "mainWalls"), &["Main Walls"]),
        FieldBinding::text(&path("construction", "mainRoof"), &["Main Roof"]),
        FieldBinding::text(&path("construction", "garageConstruction"), &["Garage:"]),
        FieldBinding::text(&path("construction", "outbuildingsConstruction"), &["Outbuildings:"]),
        FieldBinding::integer(&path("construction", "alterationsAge"), &["years ago"]),
        FieldBinding::text(
            &path("localityAndDemand", "compulsoryPurchaseDetails"),
            &["Compulsory Purchase details"],
        ),
        FieldBinding::text(
            &path("localityAndDemand", "vacantOrBoardedDetails"),
            &["vacant or boarded details"],
        ),
        FieldBinding::text(
            &path("localityAndDemand", "occupancyRestrictionDetails"),
            &["Occupancy restriction details"],
        ),
        FieldBinding::text(
            &path("localityAndDemand", "highVoltageEquipmentDetails"),
            &["high voltage equipment details"],
        ),
        FieldBinding::text(&path("services", "centralHeatingType"), &["Central heating type"]),
        FieldBinding::text(
            &path("services", "easementsOrRightsDetails"),
            &["Easements details", "Rights of Way details"],
        ),
    ]);

    // Energy efficiency and condition
    let cop = |key: &str| path("conditionsOfProperty", key);
    bindings.extend([
        FieldBinding::text(&path("energyEfficiency", "epcRating"), &["EPC Rating"]),
        FieldBinding::integer(&path("energyEfficiency", "epcScore"), &["EPC Score"]),
        FieldBinding::boolean(&cop("isStructuralMovement"), &["structural movement"]),
        FieldBinding::boolean(
            &cop("isStructuralMovementHistoricOrNonProgressive"),
            &["historic or non-progressive"],
        ),
        FieldBinding::multiline(&cop("structuralMovementDetails"), &["structural movement details"]),
        FieldBinding::boolean(&cop("isStructuralModifications"), &["structural modifications"]),
        FieldBinding::multiline(
            &cop("structuralModificationsDetails"),
            &["structural modifications details"],
        ),
        FieldBinding::boolean(&cop("communalAreasMaintained"), &["communal areas maintained"]),
    ]);
    for hazard in ["flooding", "subsidence", "heave", "landslip"] {
        bindings.push(FieldBinding::boolean(
            &cop(&format!("propertyProneTo.{hazard}")),
            &[hazard],
        ));
    }
    bindings.extend([
        FieldBinding::text(&cop("propertyProneTo.details"), &["prone to", "details"]),
        FieldBinding::boolean(
            &cop("isPlotBoundariesDefinedUnderPointFourHectares"),
            &["0.4 hectares"],
        ),
        FieldBinding::boolean(
            &cop("isTreesWithinInfluencingDistance"),
            &["trees", "influencing distance"],
        ),
        FieldBinding::boolean(&cop("isBuiltOnSteepSlope"), &["steep slope"]),
    ]);

    // Reports
    for (key, keyword) in [
        ("isTimberDamp", "Timber/Damp"),
        ("isMining", "Mining"),
        ("isElectrical", "Electrical"),
        ("isDrains", "Drains"),
        ("isStructuralEngineers", "Structural Engineer"),
        ("isArboricultural", "Arboricultural"),
        ("isMundic", "Mundic"),
        ("isWallTies", "Wall Ties"),
        ("isRoof", "Roof"),
        ("isMetalliferous", "Metalliferous"),
    ] {
        bindings.push(flag("reports", key, &[keyword]));
    }

    // Rental information and valuation
    let ri = |key: &str| path("rentalInformation", key);
    let vf = |key: &str| path(FINANCE_SECTION, key);
    bindings.extend([
        FieldBinding::boolean(&ri("isRentalDemandInLocality"), &["rental demand"]),
        FieldBinding::boolean(
            &ri("isOtherLettingDemandFactors"),
            &["other letting demand factors"],
        ),
        FieldBinding::boolean(&ri("investorOnlyDemand"), &["investor only demand"]),
        FieldBinding::currency(
            &ri("monthlyMarketRentPresentCondition"),
            &["monthly market rent", "present"],
        ),
        FieldBinding::currency(
            &ri("monthlyMarketRentImprovedCondition"),
            &["monthly market rent", "improved"],
        ),
        FieldBinding::boolean(&vf("isSuitableForFinance"), &["suitable security for finance"]),
        FieldBinding::currency(&vf("marketValuePresentCondition"), &["present condition"]),
        FieldBinding::currency(&vf("marketValueAfterRepairs"), &["after essential repairs"]),
        FieldBinding::currency(
            &vf("purchasePriceOrBorrowerEstimate"),
            &["purchase price", "estimate"],
        ),
        FieldBinding::currency(
            &vf("buildingInsuranceReinstatementCost"),
            &["Reinstatement Cost"],
        ),
        FieldBinding::multiline("generalRemarks", &["GENERAL REMARKS"]).max_lines(10),
    ]);

    // Valuer's declaration
    let vd = |key: &str| path("valuersDeclaration", key);
    for (key, keyword) in [("mrics", "MRICS"), ("frics", "FRICS"), ("assocRics", "AssocRICS")] {
        bindings.push(FieldBinding::boolean(
            &vd(&format!("valuerQualifications.{key}")),
            &[keyword],
        ));
    }
    bindings.extend([
        FieldBinding::text(&vd("valuerName"), &["Name of Valuer"]),
        FieldBinding::text(&vd("onBehalfOf"), &["on behalf of"]),
        FieldBinding::integer(&vd("telephone"), &["Telephone"]),
        FieldBinding::text(&vd("email"), &["E-mail"]),
        FieldBinding::integer(&vd("ricsNumber"), &["RICS Number"]),
        FieldBinding::multiline(&vd("valuerAddress"), &["Address of Valuer"]),
        FieldBinding::text(&vd("valuerPostcode"), &["Postcode"]),
        FieldBinding::text(&vd("reportDate"), &["Report Date"]),
    ]);

    bindings
}
