// The subset of the ISPyB schema this service reads. Table and column names follow the
// database, Rust-side names are snake_case.

diesel::table! {
    #[sql_name = "Proposal"]
    proposal (proposal_id) {
        #[sql_name = "proposalId"]
        proposal_id -> Unsigned<Integer>,
        #[sql_name = "proposalCode"]
        proposal_code -> Nullable<Varchar>,
        #[sql_name = "proposalNumber"]
        proposal_number -> Nullable<Varchar>,
    }
}

diesel::table! {
    #[sql_name = "BLSession"]
    bl_session (session_id) {
        #[sql_name = "sessionId"]
        session_id -> Unsigned<Integer>,
        #[sql_name = "proposalId"]
        proposal_id -> Unsigned<Integer>,
        #[sql_name = "beamLineName"]
        beamline_name -> Nullable<Varchar>,
        #[sql_name = "startDate"]
        start_date -> Nullable<Datetime>,
        #[sql_name = "endDate"]
        end_date -> Nullable<Datetime>,
        visit_number -> Nullable<Unsigned<Integer>>,
    }
}

diesel::table! {
    #[sql_name = "BLSample"]
    bl_sample (sample_id) {
        #[sql_name = "blSampleId"]
        sample_id -> Unsigned<Integer>,
        #[sql_name = "crystalId"]
        crystal_id -> Nullable<Unsigned<Integer>>,
        #[sql_name = "containerId"]
        container_id -> Nullable<Unsigned<Integer>>,
        name -> Nullable<Varchar>,
    }
}

diesel::table! {
    #[sql_name = "Crystal"]
    crystal (crystal_id) {
        #[sql_name = "crystalId"]
        crystal_id -> Unsigned<Integer>,
        #[sql_name = "proteinId"]
        protein_id -> Unsigned<Integer>,
    }
}

diesel::table! {
    #[sql_name = "Protein"]
    protein (protein_id) {
        #[sql_name = "proteinId"]
        protein_id -> Unsigned<Integer>,
        #[sql_name = "proposalId"]
        proposal_id -> Unsigned<Integer>,
    }
}

diesel::table! {
    #[sql_name = "Container"]
    container (container_id) {
        #[sql_name = "containerId"]
        container_id -> Unsigned<Integer>,
        code -> Nullable<Varchar>,
        #[sql_name = "containerType"]
        container_type -> Nullable<Varchar>,
        capacity -> Nullable<Integer>,
        barcode -> Nullable<Varchar>,
    }
}

diesel::table! {
    #[sql_name = "DataCollection"]
    data_collection (data_collection_id) {
        #[sql_name = "dataCollectionId"]
        data_collection_id -> Unsigned<Integer>,
        #[sql_name = "BLSAMPLEID"]
        sample_id -> Nullable<Unsigned<Integer>>,
        #[sql_name = "SESSIONID"]
        session_id -> Nullable<Unsigned<Integer>>,
        #[sql_name = "imageDirectory"]
        image_directory -> Nullable<Varchar>,
        #[sql_name = "fileTemplate"]
        file_template -> Nullable<Varchar>,
        #[sql_name = "startTime"]
        start_time -> Nullable<Datetime>,
        #[sql_name = "endTime"]
        end_time -> Nullable<Datetime>,
        #[sql_name = "axisStart"]
        axis_start -> Nullable<Float>,
        #[sql_name = "axisEnd"]
        axis_end -> Nullable<Float>,
        #[sql_name = "axisRange"]
        axis_range -> Nullable<Float>,
        overlap -> Nullable<Float>,
        #[sql_name = "numberOfImages"]
        number_of_images -> Nullable<Unsigned<Integer>>,
        #[sql_name = "startImageNumber"]
        start_image_number -> Nullable<Unsigned<Integer>>,
        #[sql_name = "exposureTime"]
        exposure_time -> Nullable<Float>,
        #[sql_name = "rotationAxis"]
        rotation_axis -> Nullable<Varchar>,
        #[sql_name = "phiStart"]
        phi_start -> Nullable<Float>,
        #[sql_name = "kappaStart"]
        kappa_start -> Nullable<Float>,
        #[sql_name = "omegaStart"]
        omega_start -> Nullable<Float>,
        #[sql_name = "chiStart"]
        chi_start -> Nullable<Float>,
    }
}

diesel::table! {
    #[sql_name = "GridInfo"]
    grid_info (grid_info_id) {
        #[sql_name = "gridInfoId"]
        grid_info_id -> Unsigned<Integer>,
        #[sql_name = "dataCollectionId"]
        data_collection_id -> Nullable<Unsigned<Integer>>,
    }
}

diesel::table! {
    #[sql_name = "AutoProcProgram"]
    auto_proc_program (auto_proc_program_id) {
        #[sql_name = "autoProcProgramId"]
        auto_proc_program_id -> Unsigned<Integer>,
        #[sql_name = "processingPrograms"]
        processing_programs -> Nullable<Varchar>,
    }
}

diesel::table! {
    #[sql_name = "AutoProcIntegration"]
    auto_proc_integration (auto_proc_integration_id) {
        #[sql_name = "autoProcIntegrationId"]
        auto_proc_integration_id -> Unsigned<Integer>,
        #[sql_name = "dataCollectionId"]
        data_collection_id -> Unsigned<Integer>,
        #[sql_name = "autoProcProgramId"]
        auto_proc_program_id -> Nullable<Unsigned<Integer>>,
    }
}

diesel::table! {
    #[sql_name = "AutoProc"]
    auto_proc (auto_proc_id) {
        #[sql_name = "autoProcId"]
        auto_proc_id -> Unsigned<Integer>,
        #[sql_name = "autoProcProgramId"]
        auto_proc_program_id -> Nullable<Unsigned<Integer>>,
        #[sql_name = "spaceGroup"]
        space_group -> Nullable<Varchar>,
        #[sql_name = "refinedCell_a"]
        refined_cell_a -> Nullable<Float>,
        #[sql_name = "refinedCell_b"]
        refined_cell_b -> Nullable<Float>,
        #[sql_name = "refinedCell_c"]
        refined_cell_c -> Nullable<Float>,
        #[sql_name = "refinedCell_alpha"]
        refined_cell_alpha -> Nullable<Float>,
        #[sql_name = "refinedCell_beta"]
        refined_cell_beta -> Nullable<Float>,
        #[sql_name = "refinedCell_gamma"]
        refined_cell_gamma -> Nullable<Float>,
    }
}

diesel::table! {
    #[sql_name = "AutoProcScaling"]
    auto_proc_scaling (auto_proc_scaling_id) {
        #[sql_name = "autoProcScalingId"]
        auto_proc_scaling_id -> Unsigned<Integer>,
        #[sql_name = "autoProcId"]
        auto_proc_id -> Nullable<Unsigned<Integer>>,
    }
}

diesel::table! {
    #[sql_name = "AutoProcScalingStatistics"]
    auto_proc_scaling_statistics (auto_proc_scaling_statistics_id) {
        #[sql_name = "autoProcScalingStatisticsId"]
        auto_proc_scaling_statistics_id -> Unsigned<Integer>,
        #[sql_name = "autoProcScalingId"]
        auto_proc_scaling_id -> Nullable<Unsigned<Integer>>,
        #[sql_name = "scalingStatisticsType"]
        scaling_statistics_type -> Varchar,
        #[sql_name = "resolutionLimitLow"]
        resolution_limit_low -> Nullable<Float>,
        #[sql_name = "resolutionLimitHigh"]
        resolution_limit_high -> Nullable<Float>,
        #[sql_name = "rMerge"]
        r_merge -> Nullable<Float>,
        #[sql_name = "meanIOverSigI"]
        mean_i_over_sig_i -> Nullable<Float>,
        completeness -> Nullable<Float>,
        multiplicity -> Nullable<Float>,
        #[sql_name = "anomalousCompleteness"]
        anomalous_completeness -> Nullable<Float>,
        #[sql_name = "anomalousMultiplicity"]
        anomalous_multiplicity -> Nullable<Float>,
        #[sql_name = "ccHalf"]
        cc_half -> Nullable<Float>,
        #[sql_name = "ccAnomalous"]
        cc_anomalous -> Nullable<Float>,
    }
}

diesel::table! {
    #[sql_name = "Person"]
    person (person_id) {
        #[sql_name = "personId"]
        person_id -> Unsigned<Integer>,
        login -> Nullable<Varchar>,
    }
}

diesel::table! {
    #[sql_name = "ProposalHasPerson"]
    proposal_has_person (proposal_has_person_id) {
        #[sql_name = "proposalHasPersonId"]
        proposal_has_person_id -> Unsigned<Integer>,
        #[sql_name = "proposalId"]
        proposal_id -> Unsigned<Integer>,
        #[sql_name = "personId"]
        person_id -> Unsigned<Integer>,
    }
}

diesel::table! {
    #[sql_name = "Session_has_Person"]
    session_has_person (session_id, person_id) {
        #[sql_name = "sessionId"]
        session_id -> Unsigned<Integer>,
        #[sql_name = "personId"]
        person_id -> Unsigned<Integer>,
    }
}

diesel::table! {
    #[sql_name = "UserGroup"]
    user_group (user_group_id) {
        #[sql_name = "userGroupId"]
        user_group_id -> Unsigned<Integer>,
        name -> Varchar,
    }
}

diesel::table! {
    #[sql_name = "Permission"]
    permission (permission_id) {
        #[sql_name = "permissionId"]
        permission_id -> Unsigned<Integer>,
        #[sql_name = "type"]
        permission_type -> Varchar,
    }
}

diesel::table! {
    #[sql_name = "UserGroup_has_Permission"]
    user_group_has_permission (user_group_id, permission_id) {
        #[sql_name = "userGroupId"]
        user_group_id -> Unsigned<Integer>,
        #[sql_name = "permissionId"]
        permission_id -> Unsigned<Integer>,
    }
}

diesel::table! {
    #[sql_name = "UserGroup_has_Person"]
    user_group_has_person (user_group_id, person_id) {
        #[sql_name = "userGroupId"]
        user_group_id -> Unsigned<Integer>,
        #[sql_name = "personId"]
        person_id -> Unsigned<Integer>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    proposal,
    bl_session,
    bl_sample,
    crystal,
    protein,
    container,
    data_collection,
    grid_info,
    auto_proc_program,
    auto_proc_integration,
    auto_proc,
    auto_proc_scaling,
    auto_proc_scaling_statistics,
    person,
    proposal_has_person,
    session_has_person,
    user_group,
    permission,
    user_group_has_permission,
    user_group_has_person,
);
